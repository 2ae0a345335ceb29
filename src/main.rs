use clap::Parser;
use page2site::results::{Analysis, Project};
use page2site::{AppState, Service, imagery, synth};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    if let Err(e) = run(args).await {
        ::log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut service = Service::new();
    if let Some(path) = &args.config {
        service = service.with_config_file(path)?;
    }
    let config = service.config().clone();
    let state = service.build()?;

    match args.command {
        Command::Analyze { url, out } => {
            let analysis = state.pipeline.analyze(&url).await?;
            write_output(out.as_deref(), &serde_json::to_string_pretty(&analysis)?)?;
        }
        Command::Preview { analysis } => {
            let analysis: Analysis = read_json(&analysis)?;
            println!("{}", synth::preview(&analysis).to_html());
        }
        Command::Export {
            project,
            from_analysis,
            out,
        } => {
            let project = if from_analysis {
                Project::from_analysis(&read_json::<Analysis>(&project)?)
            } else {
                read_json::<Project>(&project)?
            };
            let bundle = state.synthesizer.export(&project)?;
            let out = out.unwrap_or_else(|| PathBuf::from(bundle.filename));
            std::fs::write(&out, &bundle.bytes)?;
            ::log::info!("Wrote {} ({} bytes)", out.display(), bundle.bytes.len());
        }
        Command::Image { prompt, out } => {
            let image = imagery::generate_image(state.image_backend.as_deref(), &prompt).await;
            write_output(out.as_deref(), &serde_json::to_string_pretty(&image)?)?;
        }
        Command::Upload { file } => {
            let bytes = std::fs::read(&file)?;
            println!("{}", serde_json::to_string(&imagery::encode_upload(&bytes))?);
        }
        Command::Serve { addr } => {
            let addr = match addr {
                Some(addr) => addr,
                None => config.listen_addr(std::env::var("PORT").ok().as_deref())?,
            };
            serve(addr, state).await?;
        }
    }

    Ok(())
}

async fn serve(addr: std::net::SocketAddr, state: AppState) -> Result<(), Box<dyn Error>> {
    page2site::server::serve(addr, Arc::new(state)).await?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<(), Box<dyn Error>> {
    match out {
        Some(path) => {
            std::fs::write(path, contents)?;
            ::log::info!("Wrote {}", path.display());
        }
        None => println!("{}", contents),
    }
    Ok(())
}
