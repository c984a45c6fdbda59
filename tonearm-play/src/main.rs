mod runner;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(err) = runner::run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
