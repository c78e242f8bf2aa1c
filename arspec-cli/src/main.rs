fn main() {
    if let Err(e) = arspec_cli::run() {
        let _ = arspec_cli::write_error(&e, &mut std::io::stderr().lock());
        std::process::exit(1);
    }
}
