use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "shaclpg")]
/// Turns SHACL shapes into property graph schemas and back
pub struct Args {
    /// Format of the log lines written to stderr
    ///
    /// The verbosity is set with the RUST_LOG environment variable and defaults to "info".
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Transform a SHACL file into a property graph schema
    ///
    /// Writes <stem>_pg_schema.json, the property graph schema, and <stem>_transformed.ttl,
    /// the schema lifted back into SHACL shapes.
    Transform {
        /// Turtle file containing the SHACL shapes
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[command(flatten)]
        output: OutputOptions,
        #[command(flatten)]
        schema: SchemaOptions,
    },
    /// Watch a directory and transform every Turtle file added to it
    ///
    /// Files whose name contains "_transformed" or "_cypher" are outputs and are skipped.
    /// A failing transformation is logged and watching goes on.
    Watch {
        /// Directory to watch
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        directory: PathBuf,
        #[command(flatten)]
        output: OutputOptions,
        #[command(flatten)]
        schema: SchemaOptions,
    },
    /// Generate the Cypher script creating a property graph schema
    Cypher {
        /// Property graph schema JSON file, as written by the transform command
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// File in which the script is written
        ///
        /// If no file is given, stdout is used.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Validate instances against the property graph schema of a SHACL file
    ///
    /// Exits with status 1 if an instance violates the schema.
    Validate {
        /// Turtle file containing the SHACL shapes
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// JSON file containing an array of {"label": ..., "properties": {...}} instances
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        instances: PathBuf,
        #[command(flatten)]
        schema: SchemaOptions,
    },
}

#[derive(clap::Args, Clone)]
pub struct OutputOptions {
    /// Directory in which the outputs are written
    ///
    /// By default, the directory of the input file.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,
    /// Also write <stem>_schema.cypher, a Cypher script creating the schema
    #[arg(long)]
    pub cypher: bool,
    /// Also write <stem>_schema.dot, a Graphviz rendering of the schema
    #[arg(long)]
    pub dot: bool,
}

#[derive(clap::Args, Clone)]
pub struct SchemaOptions {
    /// Base IRI of the Turtle file
    #[arg(long, value_hint = ValueHint::Url)]
    pub base: Option<String>,
    /// Namespace in which lifted shapes are written
    ///
    /// By default, the namespace of the first target class.
    #[arg(long, value_hint = ValueHint::Url)]
    pub namespace: Option<String>,
    /// How relationship names become relationship types
    #[arg(long, value_enum, default_value_t = RelationshipTypes::UpperSnake)]
    pub relationship_types: RelationshipTypes,
    /// Which constraint wins when a relationship property is declared twice
    #[arg(long, value_enum, default_value_t = Precedence::Nested)]
    pub edge_property_precedence: Precedence,
    /// Only read relationship properties nested in the relationship property shape
    ///
    /// By default, properties stated on the relationship name and source properties
    /// named <relationship>_<property> are also attached to the relationship.
    #[arg(long)]
    pub no_compat_shims: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelationshipTypes {
    /// memberOf becomes MEMBER_OF
    UpperSnake,
    /// memberOf becomes MEMBEROF
    Flat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Precedence {
    /// The constraint nested in the relationship shape is kept
    Nested,
    /// The last constraint found wins
    Flattened,
}
