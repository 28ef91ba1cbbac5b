fn main() {
    if let Err(err) = survey_tidy::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
