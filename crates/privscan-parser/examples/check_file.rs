use std::env;
use privscan_parser::parse_file;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.facts>", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];

    match parse_file(filename) {
        Ok(functions) => {
            for function in &functions {
                println!(
                    " {}: {} value(s), {} instruction(s), {} loop(s)",
                    function.name,
                    function.values().len(),
                    function.instructions().len(),
                    function.regions.len()
                );
            }
        }
        Err(e) => {
            eprintln!(" Failed to load {}: {}", filename, e);
            std::process::exit(1);
        }
    }
}
