fn main() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .try_init();

    if let Err(error) = dicomseg_rs::run_cli() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
