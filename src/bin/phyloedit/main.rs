#![warn(missing_docs)]
//! The `phyloedit` binary is a command line tool, using the [`phyloedit`] crate.
//! It applies the structural edits of the library to newick files.

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use itertools::Itertools;
use phyloedit::tree::{Node, NodeId, PopulateOptions, Tree, TreeError, TreePattern};
use rand::{rngs::StdRng, SeedableRng};
use std::{fs, io, path::Path};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// contains the struct representing the command line arguments
/// parsed by [`clap`] and used to execute this binary
pub mod cli;

type Error = Box<dyn std::error::Error>;
type Result<T> = std::result::Result<T, Error>;

fn read_tree(path: &Path, internal_support: bool) -> Result<Tree> {
    let mut tree = Tree::from_file(path)?;
    if internal_support {
        let root = tree.get_root()?;
        let converted = tree.convert_internal_names_to_support(&root)?;
        debug!(converted, "read internal names as supports");
    }

    Ok(tree)
}

fn write_tree(tree: &Tree, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => tree.to_file(path)?,
        None => println!("{}", tree.to_newick()?),
    }

    Ok(())
}

fn find_node(tree: &Tree, name: &str) -> Result<NodeId> {
    match tree.get_by_name(name) {
        Some(node) => Ok(node.id),
        None => Err(format!("No node named '{name}' in the tree").into()),
    }
}

fn generate_random(
    tips: usize,
    options: &PopulateOptions,
    rng: &mut StdRng,
) -> std::result::Result<Tree, TreeError> {
    let mut tree = Tree::new();
    let root = tree.add(Node::new());
    tree.populate_with_rng(&root, tips, options, rng)?;

    Ok(tree)
}

fn run(args: cli::Args) -> Result<()> {
    let internal_support = args.internal_support;

    match args.command {
        cli::Commands::Generate {
            tips,
            random_branches,
            dist_range,
            support_range,
            seed,
            output,
            trees,
        } => {
            let options = PopulateOptions {
                names: None,
                random_branches,
                dist_range: (dist_range[0], dist_range[1]),
                support_range: (support_range[0], support_range[1]),
            };
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            if let Some(ntrees) = trees {
                let Some(output) = output else {
                    return Err(
                        "If you are generating multiple trees you must specify an output directory"
                            .into(),
                    );
                };
                fs::create_dir_all(&output)?;

                for i in 1..=ntrees {
                    let path = output.join(format!("{i}_{tips}_tips.nwk"));
                    generate_random(tips, &options, &mut rng)?.to_file(&path)?;
                }
                info!(trees = ntrees, ?output, "generated trees");
            } else {
                let tree = generate_random(tips, &options, &mut rng)?;
                write_tree(&tree, output.as_deref())?;
            }
        }
        cli::Commands::Ladderize {
            io,
            topological,
            reverse,
        } => {
            let mut tree = read_tree(&io.tree, internal_support)?;
            let root = tree.get_root()?;
            tree.ladderize(&root, topological, reverse)?;
            write_tree(&tree, io.output.as_deref())?;
        }
        cli::Commands::Sort { io, reverse } => {
            let mut tree = read_tree(&io.tree, internal_support)?;
            let root = tree.get_root()?;
            tree.sort(&root, reverse)?;
            write_tree(&tree, io.output.as_deref())?;
        }
        cli::Commands::Ultrametric { io, topological } => {
            let mut tree = read_tree(&io.tree, internal_support)?;
            let root = tree.get_root()?;
            tree.to_ultrametric(&root, topological)?;
            write_tree(&tree, io.output.as_deref())?;
        }
        cli::Commands::Outgroup { io, node, bprops } => {
            let mut tree = read_tree(&io.tree, internal_support)?;
            let target = find_node(&tree, &node)?;
            let bprops = bprops.iter().map(String::as_str).collect_vec();
            tree.set_outgroup(&target, &bprops)?;
            write_tree(&tree, io.output.as_deref())?;
        }
        cli::Commands::Ancestor { tree, names } => {
            let tree = read_tree(&tree, internal_support)?;
            let nodes: Vec<NodeId> = names
                .iter()
                .map(|name| find_node(&tree, name))
                .collect::<Result<_>>()?;

            match tree.common_ancestor(&nodes)? {
                Some(ancestor) => println!("{};", tree.subtree_to_newick(&ancestor)?),
                None => return Err("The nodes have no common ancestor".into()),
            }
        }
        cli::Commands::Search { tree, pattern } => {
            let tree = read_tree(&tree, internal_support)?;
            let pattern = TreePattern::from_newick(&pattern)?;
            let root = tree.get_root()?;
            for node in pattern.search(&tree, &root)? {
                println!("{};", tree.subtree_to_newick(&node)?);
            }
        }
        cli::Commands::Remove { io, names } => {
            let mut tree = read_tree(&io.tree, internal_support)?;
            for name in names.iter().unique() {
                let node = find_node(&tree, name)?;
                tree.remove(&node)?;
            }
            write_tree(&tree, io.output.as_deref())?;
        }
        cli::Commands::Show { tree, debug } => {
            let tree = read_tree(&tree, internal_support)?;
            if debug {
                tree.print_debug()?;
            } else {
                tree.print()?;
            }
        }
        cli::Commands::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    run(args)
}
