use clap::{arg, command, value_parser, Command};
use colored::*;
use pm_fem::q4;
use rayon::ThreadPoolBuilder;

fn main() {
    let matches = command!()
        .arg(
            arg!(
                -n --number_of_threads <NUMBER_OF_THREADS> "Sets the number of threads used by the element integration and the convergence levels"
            )
            .required(false)
            .value_parser(value_parser!(usize)),
        )
        .subcommand(Command::new("run").about("Runs the simulation"))
        .subcommand(
            Command::new("convergence")
                .about("Runs the grid refinement study")
                .arg(
                    arg!(
                        -l --levels <LEVELS> "Sets the number of refinement levels"
                    )
                    .required(false)
                    .default_value("4")
                    .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("post").about("Runs the post-processing: writes the vtk files"),
        )
        .get_matches();

    if let Some(&num_threads) = matches.get_one::<usize>("number_of_threads") {
        if let Err(e) = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            eprintln!("Error while building the thread pool: {e}.");
            std::process::exit(1);
        }
    }

    let result = match matches.subcommand() {
        Some(("run", _)) => q4::run(),
        Some(("convergence", sub_matches)) => {
            let levels = sub_matches.get_one::<usize>("levels").copied().unwrap_or(4);
            q4::run_convergence(levels)
        }
        Some(("post", _)) => q4::post::vtk::run_vtk_post_processing(),
        _ => {
            eprintln!("Nothing to do. Use the run, convergence or post subcommand.");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {e}.", "Error:".red().bold());
        std::process::exit(1);
    }
}
