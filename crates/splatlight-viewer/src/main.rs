mod app;
mod cli;
mod config;

use clap::Parser;

use cli::CliArgs;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    tracing::info!("splatlight v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().or_else(|| {
        let cwd = std::env::current_dir().ok()?;
        config::find_config(&cwd)
    });
    let config = match config_path {
        Some(path) => match config::load_config(&path) {
            Ok(c) => {
                tracing::info!("loaded config from {:?}", path);
                c
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => config::ViewerConfig::default(),
    };

    let event_loop = winit::event_loop::EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = app::App::new(args, config);
    event_loop.run_app(&mut app).expect("event loop error");
}
