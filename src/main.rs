fn main() {
    if let Err(err) = survey_inclusion::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
