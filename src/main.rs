fn main() {
    if let Err(err) = csv_pareto::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
