use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = twinkle_tree::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
