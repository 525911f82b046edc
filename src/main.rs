//! TSP Heuristics - Command Line Interface
//!
//! Builds an editor-style random graph and runs the tour heuristics on it.

use clap::{Parser, Subcommand, ValueEnum};
use tsp_heuristics::benchmark::{Benchmark, BenchmarkConfig};
use tsp_heuristics::graph::WeightedDigraph;
use tsp_heuristics::heuristics::{
    AnnealingConfig, AntColonyConfig, AntColonyOptimization, NearestNeighborHeuristic,
    PheromoneEntry, PheromoneMatrix, SimulatedAnnealing, TourSolver,
};
use tsp_heuristics::tour::SolverResult;
use tsp_heuristics::TspResult;

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "tsp-heuristics")]
#[command(version = "1.0")]
#[command(about = "Heuristic Traveling Salesman solvers on weighted directed graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a random graph with one heuristic
    Solve {
        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "nn")]
        algorithm: Algorithm,

        #[command(flatten)]
        graph: GraphArgs,

        /// Random seed for the solver
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Initial temperature (SA)
        #[arg(long, default_value = "1000")]
        temperature: f64,

        /// Cooling rate in (0, 1) (SA)
        #[arg(long, default_value = "0.9")]
        cooling_rate: f64,

        /// Number of iterations (SA)
        #[arg(long, default_value = "100")]
        iterations: usize,

        /// Pheromone importance (ACO)
        #[arg(long, default_value = "1")]
        alpha: f64,

        /// Distance importance (ACO)
        #[arg(long, default_value = "1")]
        beta: f64,

        /// Pheromone deposit Q; also runs floor(Q) * 5 generations (ACO)
        #[arg(long, default_value = "100")]
        deposit: f64,

        /// Evaporation rate in [0, 1] (ACO)
        #[arg(long, default_value = "0.5")]
        evaporation: f64,

        /// Elite ants per generation (ACO)
        #[arg(long, default_value = "1")]
        elite_count: usize,

        /// Extra deposit multiplier for elite ants (ACO)
        #[arg(long, default_value = "2")]
        elite_factor: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare all heuristics over several seeds
    Compare {
        #[command(flatten)]
        graph: GraphArgs,

        /// Number of runs per stochastic algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first run
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output CSV file with one row per run
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print statistics of a random graph and its edge table
    Analyze {
        #[command(flatten)]
        graph: GraphArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct GraphArgs {
    /// Number of nodes
    #[arg(short, long, default_value = "10")]
    nodes: usize,

    /// Probability that an ordered pair of nodes is connected
    #[arg(short, long, default_value = "1.0")]
    density: f64,

    /// Seed of the graph layout
    #[arg(long, default_value = "1")]
    graph_seed: u64,
}

impl GraphArgs {
    fn build(&self) -> WeightedDigraph {
        WeightedDigraph::random_layout(self.nodes, self.density, self.graph_seed)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Nearest Neighbor from every start node
    Nn,
    /// Simulated Annealing over random spanning trees
    Sa,
    /// Ant Colony Optimization
    Aco,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    result: &'a SolverResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pheromone: Option<Vec<PheromoneEntry>>,
}

fn render_json(result: &SolverResult, pheromone: Option<&PheromoneMatrix>) -> TspResult<String> {
    let output = JsonOutput {
        result,
        pheromone: pheromone.map(PheromoneMatrix::entries),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            algorithm,
            graph,
            seed,
            temperature,
            cooling_rate,
            iterations,
            alpha,
            beta,
            deposit,
            evaporation,
            elite_count,
            elite_factor,
            json,
            verbose,
        } => {
            let annealing = AnnealingConfig {
                initial_temperature: temperature,
                cooling_rate,
                iterations,
                seed,
                ..Default::default()
            };
            let colony = AntColonyConfig {
                alpha,
                beta,
                deposit,
                evaporation,
                elite_count,
                elite_factor,
                seed,
            };
            solve_graph(&graph, algorithm, annealing, colony, json, verbose);
        }

        Commands::Compare { graph, runs, seed, output } => {
            compare_heuristics(&graph, runs, seed, output);
        }

        Commands::Analyze { graph } => {
            analyze_graph(&graph);
        }
    }
}

fn solve_graph(
    args: &GraphArgs,
    algorithm: Algorithm,
    annealing: AnnealingConfig,
    colony: AntColonyConfig,
    json: bool,
    verbose: bool,
) {
    let graph = args.build();

    if verbose {
        println!("{}", graph.statistics());
    }

    let start = Instant::now();

    let outcome = match algorithm {
        Algorithm::Nn => NearestNeighborHeuristic::new().solve(&graph).map(|r| (r, None)),
        Algorithm::Sa => SimulatedAnnealing::new(annealing).solve(&graph).map(|r| (r, None)),
        Algorithm::Aco => AntColonyOptimization::new(colony)
            .run(&graph)
            .map(|(r, pheromone)| (r, Some(pheromone))),
    };

    let (result, pheromone) = match outcome {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if json {
        match render_json(&result, pheromone.as_ref()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("========== Results ==========");
    println!("Algorithm: {}", result.algorithm);
    println!("Time: {:.4}s", start.elapsed().as_secs_f64());
    if let Some(iter) = result.iterations {
        println!("Iterations: {}", iter);
    }
    println!();
    print!("{}", result);

    if let Some(pheromone) = pheromone {
        println!("\nPheromone:");
        print!("{}", pheromone);
    }
}

fn compare_heuristics(args: &GraphArgs, runs: usize, seed: u64, output: Option<PathBuf>) {
    let graph = args.build();

    println!(
        "Comparing heuristics on {} nodes / {} edges...\n",
        graph.node_count(),
        graph.edge_count()
    );

    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed: seed,
        ..Default::default()
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.compare(&graph);

    println!("{}", benchmark.generate_report());

    if let Some(out_path) = output {
        match benchmark.export_to_csv(&out_path) {
            Ok(()) => println!("Results exported to {:?}", out_path),
            Err(e) => {
                eprintln!("Error writing {:?}: {}", out_path, e);
                std::process::exit(1);
            }
        }
    }
}

fn analyze_graph(args: &GraphArgs) {
    let graph = args.build();

    println!("========== Graph Analysis ==========\n");
    println!("{}", graph.statistics());

    println!("\n{:>8} {:>8} {:>8}", "From", "To", "Weight");
    for (from, to, weight) in graph.edges() {
        println!("{:>8} {:>8} {:>8}", from, to, weight);
    }
}
