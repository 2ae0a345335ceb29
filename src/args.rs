use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page2site")]
#[command(about = "Analyze a web page and export it as a static site bundle")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a single page and print the analysis as JSON
    Analyze {
        /// Absolute http(s) URL of the page
        url: String,

        /// Write the analysis here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Render the preview of a saved analysis
    Preview {
        /// Analysis JSON file
        analysis: PathBuf,
    },

    /// Export a project JSON file as a zip bundle
    Export {
        /// Project JSON file
        project: PathBuf,

        /// Treat the input as an analysis and derive the project from it
        #[arg(long)]
        from_analysis: bool,

        /// Output path (defaults to the bundle's download name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate an image from a prompt
    Image {
        /// Prompt text
        #[arg(default_value = "")]
        prompt: String,

        /// Write the image JSON here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Encode an image file as a data URI
    Upload {
        /// Image file
        file: PathBuf,
    },

    /// Serve the JSON HTTP API
    Serve {
        /// Listen address, overriding config and PORT
        #[arg(long)]
        addr: Option<std::net::SocketAddr>,
    },
}
