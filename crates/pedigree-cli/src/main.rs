use pedigree_layout::graph::VertexId;
use pedigree_layout::{
    DynamicPositionedGraph, LayoutContext, PedImportOptions, from_ped, from_simple_json,
};
use serde::Serialize;
use std::io::Read;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Pedigree(pedigree_layout::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Pedigree(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<pedigree_layout::Error> for CliError {
    fn from(value: pedigree_layout::Error) -> Self {
        Self::Pedigree(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Import,
    Layout,
    Summary,
}

#[derive(Debug, Clone, Copy, Default)]
enum InputFormat {
    #[default]
    Ped,
    SimpleJson,
}

impl FromStr for InputFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ped" => Ok(Self::Ped),
            "json" | "simple-json" => Ok(Self::SimpleJson),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    format: Option<InputFormat>,
    pretty: bool,
    ped: PedImportOptions,
}

/// One person or relationship as drawn.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DrawnNode {
    id: VertexId,
    kind: &'static str,
    generation: usize,
    x: f64,
    y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    childhub: Option<pedigree_layout::Point>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    persons: usize,
    relationships: usize,
    generations: usize,
    proband: Option<VertexId>,
    consanguineous_relationships: Vec<VertexId>,
}

fn usage() -> &'static str {
    "pedigree-cli\n\
\n\
USAGE:\n\
  pedigree-cli [import] [--format ped|json] [--accept-other-phenotypes] [--mark-evaluated] [--external-ids] [--affected-one] [--pretty] [<path>|-]\n\
  pedigree-cli layout [--pretty] [<path>|-]\n\
  pedigree-cli summary [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - import reads a LINKAGE .ped file or a simple JSON array and prints the saved layout.\n\
  - layout and summary read a saved layout (the output of import).\n\
  - The input format of import defaults to the file extension (.json), then to ped.\n\
  - Set RUST_LOG (e.g. RUST_LOG=pedigree_layout=debug) for diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "import" => args.command = Command::Import,
            "layout" => args.command = Command::Layout,
            "summary" => args.command = Command::Summary,
            "--pretty" => args.pretty = true,
            "--accept-other-phenotypes" => args.ped.accept_other_phenotypes = true,
            "--mark-evaluated" => args.ped.mark_evaluated = true,
            "--external-ids" => args.ped.save_id_as_external_id = true,
            "--affected-one" => args.ped.affected_code_one = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.format = Some(
                    fmt.parse::<InputFormat>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn input_format(args: &Args) -> InputFormat {
    args.format.unwrap_or_else(|| match args.input.as_deref() {
        Some(path) if path.to_ascii_lowercase().ends_with(".json") => InputFormat::SimpleJson,
        _ => InputFormat::Ped,
    })
}

fn load_layout(text: &str) -> Result<DynamicPositionedGraph, CliError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Ok(DynamicPositionedGraph::from_layout_json(
        &value,
        LayoutContext::default(),
    )?)
}

fn drawn_nodes(dg: &DynamicPositionedGraph) -> Result<Vec<DrawnNode>, CliError> {
    let mut nodes = Vec::new();
    for v in 0..dg.graph().real_vertex_count() {
        let kind = if dg.is_placeholder(v) {
            "placeholder"
        } else if dg.is_person(v) {
            "person"
        } else if dg.is_relationship(v) {
            "relationship"
        } else {
            continue;
        };
        let point = dg.position(v)?;
        let childhub = if dg.is_relationship(v) {
            Some(dg.relationship_childhub_position(v)?)
        } else {
            None
        };
        nodes.push(DrawnNode {
            id: v,
            kind,
            generation: dg.generation(v)?,
            x: point.x,
            y: point.y,
            childhub,
        });
    }
    Ok(nodes)
}

fn summary(dg: &DynamicPositionedGraph) -> Result<Summary, CliError> {
    let n = dg.graph().real_vertex_count();
    let relationships: Vec<VertexId> = (0..n).filter(|&v| dg.is_relationship(v)).collect();
    let mut consanguineous = Vec::new();
    for &rel in &relationships {
        if dg.is_consangr_relationship(rel)? {
            consanguineous.push(rel);
        }
    }
    let mut generations = 0;
    for v in dg.all_person_ids() {
        generations = generations.max(dg.generation(v)?);
    }
    Ok(Summary {
        persons: dg.all_person_ids().len(),
        relationships: relationships.len(),
        generations,
        proband: dg.proband(),
        consanguineous_relationships: consanguineous,
    })
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    tracing::debug!(command = ?args.command, bytes = text.len(), "input read");

    match args.command {
        Command::Import => {
            let imported = match input_format(&args) {
                InputFormat::Ped => from_ped(&text, &args.ped)?,
                InputFormat::SimpleJson => from_simple_json(&text)?,
            };
            let dg = imported.into_layout(LayoutContext::default())?;
            write_json(&dg.to_json()?, args.pretty)
        }
        Command::Layout => {
            let dg = load_layout(&text)?;
            write_json(&drawn_nodes(&dg)?, args.pretty)
        }
        Command::Summary => {
            let dg = load_layout(&text)?;
            write_json(&summary(&dg)?, args.pretty)
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
