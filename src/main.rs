fn main() {
    if let Err(err) = cartolabel::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
