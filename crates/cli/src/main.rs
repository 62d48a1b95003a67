use advice::{AdviceParser, AdviceReport, FunctionOrder, ParseMode};
use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use common::logging::{init_logging, LogOptions};
use common::ExclusionRules;
use resolver::{ExclusionFilter, Resolution, Resolver};
use std::path::{Path, PathBuf};
use symtab::{IndexReport, SymbolIndexer, VariantPrefix};

const DEFAULT_FUNCTIONS: &str = "dists/emscripten/asyncify-imports.json";
const DEFAULT_IMPORTS: &str = "dists/emscripten/asyncify-imports.txt";
const IGNORED_PREVIEW: usize = 5;

#[derive(Parser)]
#[command(name = "asyncify-imports")]
#[command(about = "Derive the asyncify imports list from compiler advice and module exports", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace). Falls back to ASYNCIFY_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Log format (text, json). Falls back to ASYNCIFY_LOG_FORMAT.
    #[arg(long, global = true)]
    log_format: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an asyncify advice log into a JSON list of instrumented functions.
    Advise {
        /// Advice log written by the compiler.
        log: PathBuf,
        #[arg(short, long, default_value = DEFAULT_FUNCTIONS)]
        output: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
        /// Print the busiest callees and callee namespaces.
        #[arg(long)]
        stats: bool,
        /// Number of callees listed by --stats.
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Index the exports of a module dump by demangled name.
    Index {
        /// Module introspection dump.
        dump: PathBuf,
        /// Write the index as JSON here instead of printing a summary only.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Store export names without the `env.` prefix.
        #[arg(long)]
        bare: bool,
    },
    /// Resolve a function list against a module dump.
    Resolve {
        /// JSON list produced by `advise`.
        #[arg(long, default_value = DEFAULT_FUNCTIONS)]
        functions: PathBuf,
        /// Module introspection dump.
        #[arg(long)]
        dump: PathBuf,
        #[arg(short, long, default_value = DEFAULT_IMPORTS)]
        output: PathBuf,
        #[arg(long)]
        bare: bool,
        #[command(flatten)]
        exclude: ExcludeArgs,
    },
    /// Run advise, index and resolve in one go.
    Run {
        #[arg(long)]
        log: PathBuf,
        #[arg(long)]
        dump: PathBuf,
        /// Where to keep the intermediate function list.
        #[arg(long, default_value = DEFAULT_FUNCTIONS)]
        functions_out: PathBuf,
        #[arg(short, long, default_value = DEFAULT_IMPORTS)]
        output: PathBuf,
        #[arg(long)]
        bare: bool,
        #[command(flatten)]
        parse: ParseArgs,
        #[command(flatten)]
        exclude: ExcludeArgs,
    },
}

#[derive(Args)]
struct ParseArgs {
    #[arg(long, value_enum, default_value_t = ModeArg::Strict)]
    mode: ModeArg,
    /// Function list order (default: encounter for strict, sorted for permissive).
    #[arg(long, value_enum)]
    order: Option<OrderArg>,
}

#[derive(Args)]
struct ExcludeArgs {
    /// JSON rules file: `{ "prefixes": [...] }`. Replaces the built-in prefixes.
    #[arg(long, env = "ASYNCIFY_EXCLUDE_RULES")]
    rules: Option<PathBuf>,
    /// Extra excluded name prefix (repeatable).
    #[arg(long = "exclude", value_name = "PREFIX")]
    extra: Vec<String>,
    /// Start from an empty prefix list.
    #[arg(long)]
    no_default_excludes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Strict,
    Permissive,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Encounter,
    Sorted,
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: .env: {}", e);
        }
    }

    let cli = Cli::parse();
    let options = LogOptions::resolve(cli.log_level.as_deref(), cli.log_format.as_deref());
    init_logging(&options);

    match &cli.command {
        Commands::Advise {
            log,
            output,
            parse,
            stats,
            top,
        } => cmd_advise(log, output, parse, stats.then_some(*top)),
        Commands::Index { dump, output, bare } => cmd_index(dump, output.as_deref(), *bare),
        Commands::Resolve {
            functions,
            dump,
            output,
            bare,
            exclude,
        } => cmd_resolve(functions, dump, output, *bare, exclude),
        Commands::Run {
            log,
            dump,
            functions_out,
            output,
            bare,
            parse,
            exclude,
        } => {
            let report = advise(log, functions_out, parse)?;
            let index = build_index(dump, *bare)?;
            let resolution = resolve(&report.functions, &index, exclude)?;
            write_imports(&resolution, output)
        }
    }
}

// ---------------------------------------------------------------------------
// advise
// ---------------------------------------------------------------------------

fn cmd_advise(
    log: &Path,
    output: &Path,
    args: &ParseArgs,
    stats_top: Option<usize>,
) -> anyhow::Result<()> {
    let report = advise(log, output, args)?;
    if let Some(top) = stats_top {
        print_stats(&report, top);
    }
    Ok(())
}

fn advise(log: &Path, output: &Path, args: &ParseArgs) -> anyhow::Result<AdviceReport> {
    let mode = match args.mode {
        ModeArg::Strict => ParseMode::Strict,
        ModeArg::Permissive => ParseMode::Permissive,
    };
    let mut parser = AdviceParser::new(mode);
    if let Some(order) = args.order {
        parser = parser.with_order(match order {
            OrderArg::Encounter => FunctionOrder::Encounter,
            OrderArg::Sorted => FunctionOrder::Sorted,
        });
    }

    let report = parser
        .parse_file(log)
        .with_context(|| format!("Failed to parse advice log {}", log.display()))?;
    report
        .write_functions(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("+------------------------------------------+");
    println!("| ASYNCIFY ADVICE                          |");
    println!("+------------------------------------------+");
    println!("| Advice lines   : {:>22} |", report.lines_read);
    println!("| Callees        : {:>22} |", report.callees.len());
    println!("| Functions      : {:>22} |", report.functions.len());
    println!("| Ignored        : {:>22} |", report.ignored.len());
    println!("+------------------------------------------+");
    println!("Function list written to {}", output.display());

    Ok(report)
}

fn print_stats(report: &AdviceReport, top: usize) {
    let stats = report.stats();

    println!("\nBUSIEST CALLEES (top {}):", top);
    for (callee, count) in stats.top(top) {
        println!("  {:>6}  {}", count, callee);
    }

    println!("\nCALLEE NAMESPACES:");
    for (namespace, callees) in &stats.namespaces {
        println!("  {} ({})", namespace, callees.len());
    }

    println!(
        "\n{} callees, {} edges, {} namespaces",
        stats.counts.len(),
        stats.edges,
        stats.namespaces.len()
    );
}

// ---------------------------------------------------------------------------
// index
// ---------------------------------------------------------------------------

fn cmd_index(dump: &Path, output: Option<&Path>, bare: bool) -> anyhow::Result<()> {
    let report = build_index(dump, bare)?;
    if let Some(output) = output {
        report
            .index
            .write_json(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Symbol index written to {}", output.display());
    }
    Ok(())
}

fn build_index(dump: &Path, bare: bool) -> anyhow::Result<IndexReport> {
    let prefix = if bare {
        VariantPrefix::Bare
    } else {
        VariantPrefix::Env
    };
    let report = SymbolIndexer::itanium(prefix)
        .index_file(dump)
        .with_context(|| format!("Failed to read module dump {}", dump.display()))?;

    println!("+------------------------------------------+");
    println!("| MODULE EXPORTS                           |");
    println!("+------------------------------------------+");
    println!("| Export lines   : {:>22} |", report.exports);
    println!("| Symbols        : {:>22} |", report.index.len());
    println!("| Ignored lines  : {:>22} |", report.ignored.len());
    println!("+------------------------------------------+");
    for line in ignored_preview(&report.ignored, IGNORED_PREVIEW) {
        println!("  ignored: {}", line);
    }
    if report.ignored.len() > IGNORED_PREVIEW {
        println!("  ... {} more", report.ignored.len() - IGNORED_PREVIEW);
    }
    if report.index.is_empty() {
        tracing::warn!(dump = %dump.display(), "no export entries found");
    }

    Ok(report)
}

fn ignored_preview(ignored: &[String], n: usize) -> &[String] {
    &ignored[..ignored.len().min(n)]
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

fn cmd_resolve(
    functions: &Path,
    dump: &Path,
    output: &Path,
    bare: bool,
    exclude: &ExcludeArgs,
) -> anyhow::Result<()> {
    let list = resolver::read_function_list(functions)
        .with_context(|| format!("Failed to read function list {}", functions.display()))?;
    let index = build_index(dump, bare)?;
    let resolution = resolve(&list, &index, exclude)?;
    write_imports(&resolution, output)
}

fn exclusion_rules(args: &ExcludeArgs) -> anyhow::Result<ExclusionRules> {
    let mut rules = match &args.rules {
        Some(path) => ExclusionRules::load(path)
            .with_context(|| format!("Failed to load rules {}", path.display()))?,
        None if args.no_default_excludes => ExclusionRules::empty(),
        None => ExclusionRules::default(),
    };
    rules.extend(args.extra.iter().cloned());
    Ok(rules)
}

fn resolve(
    functions: &[String],
    index: &IndexReport,
    exclude: &ExcludeArgs,
) -> anyhow::Result<Resolution> {
    let rules = exclusion_rules(exclude)?;
    tracing::info!(prefixes = ?rules.prefixes, "exclusion rules");
    let filter = ExclusionFilter::new(rules.prefixes)?;
    Ok(Resolver::new(filter).resolve(functions, &index.index))
}

fn write_imports(resolution: &Resolution, output: &Path) -> anyhow::Result<()> {
    resolver::write_import_literal(&resolution.imports, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("+------------------------------------------+");
    println!("| ASYNCIFY IMPORTS                         |");
    println!("+------------------------------------------+");
    println!("| Imports        : {:>22} |", resolution.imports.len());
    println!("| Excluded       : {:>22} |", resolution.excluded.len());
    println!("| Not exported   : {:>22} |", resolution.missing.len());
    println!("+------------------------------------------+");
    println!("Imports list written to {}", output.display());
    Ok(())
}
