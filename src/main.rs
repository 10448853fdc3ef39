fn main() {
    if let Err(err) = metro_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
