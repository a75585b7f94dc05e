use crate::cli::{
    Args, Command, LogFormat, OutputOptions, Precedence, RelationshipTypes, SchemaOptions,
};
use anyhow::Context;
use clap::Parser;
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};
use oxrdf::Graph;
use shaclpg::io::json::PgSchemaDocument;
use shaclpg::io::turtle::{load_graph, write_graph};
use shaclpg::io::{cypher, dot};
use shaclpg::{
    CompatShims, EdgePropertyPrecedence, ExtractOptions, Instance, LoweringOptions,
    PipelineOptions, RelationshipTypeStyle, SchemaPipeline, validate_instances,
};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.log_format);
    match args.command {
        Command::Transform {
            file,
            output,
            schema,
        } => {
            transform_file(&file, &output, &schema)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch {
            directory,
            output,
            schema,
        } => {
            watch(&directory, &output, &schema)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Cypher { file, output } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document: PgSchemaDocument = json.parse().with_context(|| {
                format!("{} is not a property graph schema document", file.display())
            })?;
            let script = cypher::generate(&document);
            if let Some(output) = output {
                fs::write(&output, script)
                    .with_context(|| format!("Failed to write {}", output.display()))?;
            } else {
                let mut stdout = io::stdout().lock();
                stdout.write_all(script.as_bytes())?;
                stdout.flush()?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Validate {
            file,
            instances: instances_file,
            schema,
        } => {
            let shapes = load_shapes(&file, schema.base.as_deref())?;
            let output = pipeline(&schema).run(&file.display().to_string(), &shapes)?;
            let reader = BufReader::new(
                File::open(&instances_file)
                    .with_context(|| format!("Failed to open {}", instances_file.display()))?,
            );
            let instances: Vec<Instance> =
                serde_json::from_reader(reader).with_context(|| {
                    format!("{} is not an array of instances", instances_file.display())
                })?;
            let report = validate_instances(&output.pg_schema, &instances);
            writeln!(io::stdout().lock(), "{}", report.to_string().trim_end())?;
            Ok(if report.conforms() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn pipeline(options: &SchemaOptions) -> SchemaPipeline {
    let mut extract = ExtractOptions::default();
    if let Some(namespace) = &options.namespace {
        extract = extract.with_namespace(namespace);
    }
    let lowering = LoweringOptions::default()
        .with_relationship_types(match options.relationship_types {
            RelationshipTypes::UpperSnake => RelationshipTypeStyle::UpperSnake,
            RelationshipTypes::Flat => RelationshipTypeStyle::Flat,
        })
        .with_edge_property_precedence(match options.edge_property_precedence {
            Precedence::Nested => EdgePropertyPrecedence::Nested,
            Precedence::Flattened => EdgePropertyPrecedence::Flattened,
        })
        .with_compat_shims(if options.no_compat_shims {
            CompatShims::NONE
        } else {
            CompatShims::default()
        });
    SchemaPipeline::new(PipelineOptions { extract, lowering })
}

fn load_shapes(file: &Path, base: Option<&str>) -> anyhow::Result<Graph> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );
    load_graph(reader, base).with_context(|| format!("Failed to parse {}", file.display()))
}

fn transform_file(
    file: &Path,
    output: &OutputOptions,
    schema: &SchemaOptions,
) -> anyhow::Result<()> {
    let stem = file
        .file_stem()
        .and_then(OsStr::to_str)
        .with_context(|| format!("{} has no usable file name", file.display()))?;
    let directory = match &output.output {
        Some(directory) => directory.clone(),
        None => file.parent().map_or_else(PathBuf::new, Path::to_path_buf),
    };
    if !directory.as_os_str().is_empty() {
        fs::create_dir_all(&directory)
            .with_context(|| format!("Failed to create {}", directory.display()))?;
    }

    let shapes = load_shapes(file, schema.base.as_deref())?;
    let result = pipeline(schema).run(&file.display().to_string(), &shapes)?;
    let document = PgSchemaDocument::from_graph(&result.pg_schema);

    let json_path = directory.join(format!("{stem}_pg_schema.json"));
    let mut writer = BufWriter::new(create_file(&json_path)?);
    document.write(&mut writer)?;
    writer.flush()?;

    let turtle_path = directory.join(format!("{stem}_transformed.ttl"));
    write_graph(
        &result.shacl,
        BufWriter::new(create_file(&turtle_path)?),
        result.statements.namespace(),
    )?
    .flush()?;

    if output.cypher {
        let path = directory.join(format!("{stem}_schema.cypher"));
        fs::write(&path, cypher::generate(&document))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if output.dot {
        let path = directory.join(format!("{stem}_schema.dot"));
        fs::write(&path, dot::render(&result.pg_schema))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    info!(
        input = %file.display(),
        schema = %json_path.display(),
        shapes = %turtle_path.display(),
        "Transformation done"
    );
    Ok(())
}

fn create_file(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

/// Transforms the Turtle files appearing in `directory` until the watcher stops.
fn watch(directory: &Path, output: &OutputOptions, schema: &SchemaOptions) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher =
        notify::recommended_watcher(tx).context("Failed to start the file watcher")?;
    watcher
        .watch(directory, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", directory.display()))?;
    info!(directory = %directory.display(), "Watching for SHACL files");

    for event in rx {
        let event = match event {
            Ok(event) => event,
            Err(error) => {
                warn!(%error, "File watcher error");
                continue;
            }
        };
        if !is_written(&event.kind) {
            continue;
        }
        for path in event.paths.iter().filter(|path| is_schema_file(path)) {
            if fs::metadata(path).is_ok_and(|metadata| metadata.len() == 0) {
                debug!(file = %path.display(), "Empty file, waiting for its content");
                continue;
            }
            info!(file = %path.display(), "Transforming new schema file");
            if let Err(error) = transform_file(path, output, schema) {
                error!(file = %path.display(), error = ?error, "Transformation failed");
            }
        }
    }
    Ok(())
}

fn is_written(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::File | CreateKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

fn is_schema_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(OsStr::to_str) else {
        return false;
    };
    Path::new(name)
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("ttl"))
        && !name.contains("_transformed")
        && !name.contains("_cypher")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_are_not_schema_files() {
        assert!(is_schema_file(Path::new("schemas/person.ttl")));
        assert!(is_schema_file(Path::new("schemas/PERSON.TTL")));
        assert!(!is_schema_file(Path::new("schemas/person_transformed.ttl")));
        assert!(!is_schema_file(Path::new("schemas/person_cypher.ttl")));
        assert!(!is_schema_file(Path::new("schemas/person_pg_schema.json")));
        assert!(!is_schema_file(Path::new("schemas/")));
    }

    #[test]
    fn only_finished_writes_trigger_a_transformation() {
        assert!(is_written(&EventKind::Create(CreateKind::File)));
        assert!(is_written(&EventKind::Modify(ModifyKind::Name(
            RenameMode::To
        ))));
        assert!(!is_written(&EventKind::Create(CreateKind::Folder)));
        assert!(!is_written(&EventKind::Remove(
            notify::event::RemoveKind::File
        )));
    }
}
