use clap::{Args as ClapArgs, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// A command line tool to edit phylogenetic trees in place
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Print debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read numeric internal node names as branch supports
    #[arg(long, global = true)]
    pub internal_support: bool,

    #[command(subcommand)]
    /// The command to execute
    pub command: Commands,
}

/// Input tree and output file shared by the editing commands
#[derive(ClapArgs, Debug)]
pub struct Io {
    /// Input newick file of the tree
    pub tree: PathBuf,

    /// File to save the tree to, the tree is printed if missing
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// The available commands in the `phyloedit` tool
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate random tree(s)
    Generate {
        /// Number of tips in the generated tree
        #[arg(short, long, default_value_t = 20)]
        tips: usize,

        /// Draw branch lengths and supports uniformly instead of setting them to 1
        #[arg(short, long)]
        random_branches: bool,

        /// Range of the random branch lengths
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.0, 1.0])]
        dist_range: Vec<f64>,

        /// Range of the random supports
        #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], default_values_t = [0.0, 1.0])]
        support_range: Vec<f64>,

        /// Seed of the random generator
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output file (directory if generating multiple trees)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trees to generate
        #[arg(short = 'n', long)]
        trees: Option<usize>,
    },

    /// Sort children so that smaller subtrees come first
    Ladderize {
        #[command(flatten)]
        io: Io,
        /// Measure subtrees in number of branches instead of branch lengths
        #[arg(short, long)]
        topological: bool,
        /// Put larger subtrees first
        #[arg(short, long)]
        reverse: bool,
    },

    /// Sort children by number of leaves, depth and name
    Sort {
        #[command(flatten)]
        io: Io,
        /// Sort in decreasing order
        #[arg(short, long)]
        reverse: bool,
    },

    /// Rescale branch lengths so that all leaves are at the same depth
    Ultrametric {
        #[command(flatten)]
        io: Io,
        /// Give every branch the same length first
        #[arg(short, long)]
        topological: bool,
    },

    /// Reroot the tree on a node
    Outgroup {
        #[command(flatten)]
        io: Io,
        /// Name of the outgroup node
        #[arg(short, long)]
        node: String,
        /// Node properties that describe branches and move with them
        #[arg(short, long, value_delimiter = ',')]
        bprops: Vec<String>,
    },

    /// Print the subtree of the common ancestor of some nodes
    Ancestor {
        /// Input newick file of the tree
        tree: PathBuf,
        /// Names of the nodes
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print the subtrees matching a pattern
    Search {
        /// Input newick file of the tree
        tree: PathBuf,
        /// Newick pattern: named nodes must match by name, unnamed nodes match anything
        pattern: String,
    },

    /// Remove nodes and their subtrees from the tree
    Remove {
        #[command(flatten)]
        io: Io,
        /// Names of nodes to remove
        #[arg(short, long, required = true)]
        names: Vec<String>,
    },

    /// Draw the tree in the terminal
    Show {
        /// Input newick file of the tree
        tree: PathBuf,
        /// Show all node fields
        #[arg(short, long)]
        debug: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate the completion script for
        #[arg(value_enum)]
        shell: Shell,
    },
}
