use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use docflip::{Config, Dispatcher, DocxBackend, FormState, Report, ReportKind};

#[derive(Clone, Copy, ValueEnum)]
enum StageMode {
    /// Stage DOCX input only where editors lock open files (Windows)
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Native,
    Libreoffice,
}

#[derive(Parser)]
#[command(name = "docflip", about = "Convert PDF files to DOCX and DOCX files to PDF")]
struct Args {
    /// Input PDF or DOCX file
    input: PathBuf,
    /// Output file (defaults to the input name with the other extension)
    output: Option<PathBuf>,
    /// Write the output into this directory, keeping its file name
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// First page to convert, 1-based (PDF input only)
    #[arg(long)]
    start_page: Option<String>,
    /// Last page to convert, 1-based (PDF input only)
    #[arg(long)]
    end_page: Option<String>,
    /// Convert DOCX input from a temporary copy
    #[arg(long, value_enum, default_value = "auto")]
    stage_docx: StageMode,
    /// Directory for temporary copies
    #[arg(long)]
    temp_dir: Option<PathBuf>,
    /// Converter used for DOCX to PDF
    #[arg(long, value_enum, default_value = "native")]
    docx_backend: Backend,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::from_host().with_docx_backend(match args.docx_backend {
        Backend::Native => DocxBackend::Native,
        Backend::Libreoffice => DocxBackend::LibreOffice,
    });
    match args.stage_docx {
        StageMode::Auto => {}
        StageMode::Always => config = config.with_stage_docx(true),
        StageMode::Never => config = config.with_stage_docx(false),
    }
    if let Some(dir) = args.temp_dir {
        config = config.with_temp_dir(dir);
    }

    let mut form = FormState::default();
    form.select_input(args.input);
    if let Some(output) = args.output {
        form.output = output;
    }
    if let Some(dir) = &args.output_dir {
        form.select_output_dir(dir);
    }
    form.set_pages(args.start_page.as_deref(), args.end_page.as_deref());

    let outcome = form.submit(&Dispatcher::new(config));
    let report = Report::from_outcome(&outcome);
    match report.kind {
        ReportKind::Info => println!("{}", report.message),
        ReportKind::Error => {
            eprintln!("{report}");
            std::process::exit(1);
        }
    }
}
