use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "img-press",
    about = "Batch image compression with resizing, format conversion and multi-strategy PNG optimization",
    long_about = "img-press walks an input directory tree (or glob), compresses every supported \
                  image (JPEG, PNG, WebP, TIFF, BMP) and writes the results to a mirrored output \
                  tree. PNG inputs are trialled against up to three encoding strategies and the \
                  smallest result wins.",
    version,
    after_help = "EXAMPLES:\n  \
    img-press run ./photos -o ./compressed -q 80\n  \
    img-press run ./photos -o ./web -f webp -r 1920x1080\n  \
    img-press run ./icons --aggressive-png --ultra-png\n  \
    img-press init-config img-press.config.json"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress a directory tree of images",
        long_about = "Walk the input directory (or expand the glob pattern), compress every \
                      supported image and mirror the directory structure under the output root. \
                      Options not given on the command line are read from the nearest config \
                      file (img-press.config.json, .img-press.json or .img-pressrc), searched \
                      upward from the working directory."
    )]
    Run {
        #[arg(help = "Input directory, file, or glob pattern")]
        input: String,

        #[arg(
            short = 'o',
            long,
            help = "Output directory (default: ./output)",
            long_help = "Output root directory. The input tree is mirrored below it; missing \
                         directories are created."
        )]
        output: Option<PathBuf>,

        #[arg(
            short = 'q',
            long,
            help = "Compression quality 0-100 (default: 80)",
            long_help = "Perceptual quality from 0 (smallest) to 100 (best). For PNG this maps \
                         onto deflate compression level; for JPEG and WebP it is the encoder \
                         quality parameter."
        )]
        quality: Option<u8>,

        #[arg(
            short = 'r',
            long,
            help = "Resize to fit WIDTHxHEIGHT (e.g. 800x600)",
            long_help = "Resize images to fit inside WIDTHxHEIGHT, preserving aspect ratio. \
                         Images smaller than the target are never upscaled."
        )]
        resize: Option<String>,

        #[arg(
            short = 'f',
            long,
            help = "Output format: jpeg, png, webp (default: keep original)",
            long_help = "Convert all images to the given format and rewrite output extensions \
                         accordingly. Without this option each image keeps its own format."
        )]
        format: Option<String>,

        #[arg(
            long,
            help = "Escalate PNG compression (slower, smaller)",
            long_help = "Always run the aggressive PNG strategy in addition to the standard one. \
                         Also raises WebP encoding effort."
        )]
        aggressive_png: bool,

        #[arg(
            long,
            help = "Always try the ultra PNG strategy (slowest, smallest)",
            long_help = "Always run the ultra PNG strategy: heavy palette reduction followed by \
                         maximum-effort compression."
        )]
        ultra_png: bool,

        #[arg(
            long,
            help = "Process files below the minimum size instead of copying them"
        )]
        no_skip_small: bool,

        #[arg(
            long,
            help = "Minimum file size to process in bytes (default: 1024)",
            long_help = "Files below this size are copied verbatim to the output tree instead of \
                         being re-encoded. Use --no-skip-small to disable the gate entirely."
        )]
        min_size: Option<u64>,

        #[arg(
            short = 'j',
            long,
            help = "Number of parallel threads (default: auto)"
        )]
        threads: Option<usize>,

        #[arg(long, help = "Ignore config files")]
        no_config: bool,

        #[arg(long, help = "Suppress per-file output")]
        quiet: bool,

        #[arg(long, help = "Print extra diagnostics")]
        verbose: bool,
    },

    #[command(
        about = "Write a sample config file",
        long_about = "Write a starting-point JSON config with the default options spelled out. \
                      Config files are discovered by searching the working directory and its \
                      ancestors; the nearest file wins."
    )]
    InitConfig {
        #[arg(
            help = "Path for the new config file",
            default_value = "img-press.config.json"
        )]
        path: PathBuf,
    },
}
