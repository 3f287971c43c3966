fn main() {
    if let Err(err) = ticket_insights::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
