use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use selfde_core::error::SelfdeResult;
use selfde_core::feature::{self, VectorLayout};
use selfde_core::registers::catalog::NumberingScheme;
use selfde_core::registers::{RegisterCatalog, RegisterDescriptor, RegisterSetId};
use selfde_utils::{info, init_logging_with, LogLevel, LoggingConfig};

/// Inspect the register catalog and exception monitoring of this host.
#[derive(Parser, Debug)]
#[command(name = "selfde")]
#[command(version)]
#[command(about = "Self-debugging backend: x86-64 register catalog and Mach exception monitor", long_about = None)]
struct Cli
{
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print the register catalog
    Registers
    {
        /// Vector layout to show (default: the one detected on this host)
        #[arg(long, value_enum, default_value_t = LayoutArg::Auto)]
        layout: LayoutArg,
        /// Only show one register set
        #[arg(long, value_enum)]
        set: Option<SetArg>,
    },
    /// Print the detected vector layout and its inputs
    Features,
    /// Trap an int3 on a worker thread and print what the controller sees
    Trap,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LayoutArg
{
    Auto,
    Legacy,
    Extended,
}

impl LayoutArg
{
    fn resolve(self) -> VectorLayout
    {
        match self {
            LayoutArg::Auto => feature::vector_layout(),
            LayoutArg::Legacy => VectorLayout::Legacy,
            LayoutArg::Extended => VectorLayout::Extended,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SetArg
{
    Gpr,
    Fpu,
    Exc,
}

impl From<SetArg> for RegisterSetId
{
    fn from(set: SetArg) -> Self
    {
        match set {
            SetArg::Gpr => RegisterSetId::GeneralPurpose,
            SetArg::Fpu => RegisterSetId::FloatingPoint,
            SetArg::Exc => RegisterSetId::ExceptionState,
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    // SELFDE_LOG_FORMAT / SELFDE_LOG_FILE, with --verbose taking precedence over RUST_LOG
    let mut config = match LoggingConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };
    if cli.verbose {
        config.level = Some(LogLevel::Debug);
    }
    if let Err(e) = init_logging_with(&config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> SelfdeResult<()>
{
    info!(command = ?cli.command, "Running command");
    match cli.command {
        Commands::Registers { layout, set } => {
            let catalog = RegisterCatalog::for_layout(layout.resolve());
            print_catalog(catalog, set.map(RegisterSetId::from));
            Ok(())
        }
        Commands::Features => {
            print_features();
            Ok(())
        }
        Commands::Trap => trap::run(),
    }
}

fn print_catalog(catalog: &RegisterCatalog, only: Option<RegisterSetId>)
{
    println!(
        "{} layout, canonical context {} bytes",
        catalog.layout().name(),
        catalog.canonical_len()
    );

    for set in catalog.register_sets() {
        let Some(registers) = set.registers else {
            continue;
        };
        if only.is_some_and(|wanted| wanted != set.id) {
            continue;
        }

        println!("\n{} (set {}, {} registers)", set.name, set.id as u32, set.count);
        println!(
            "  {:<4} {:<11} {:>4} {:>6} {:>8} {:>6} {:>8} {:>5}  {}",
            "idx", "name", "size", "offset", "eh_frame", "dwarf", "generic", "wire", "contained in"
        );
        for descriptor in registers {
            print_descriptor(descriptor);
        }
    }
}

fn print_descriptor(descriptor: &RegisterDescriptor)
{
    let number = |scheme| {
        descriptor
            .number(scheme)
            .map_or_else(|| "-".to_string(), |n: u32| n.to_string())
    };
    let name = match descriptor.alt_name {
        Some(alt) => format!("{}/{}", descriptor.name, alt),
        None => descriptor.name.to_string(),
    };

    println!(
        "  {:<4} {:<11} {:>4} {:>6} {:>8} {:>6} {:>8} {:>5}  {}",
        descriptor.index,
        name,
        descriptor.size,
        descriptor.offset,
        number(NumberingScheme::EhFrame),
        number(NumberingScheme::Dwarf),
        descriptor.generic.map_or("-", |role| role.name()),
        number(NumberingScheme::Wire),
        descriptor.contained_in.unwrap_or("")
    );
}

fn print_features()
{
    let host = feature::host_features();
    let catalog = RegisterCatalog::for_layout(host.layout);

    println!("Host Features:");
    println!("  CPU AVX: {}", host.cpu_has_avx);
    println!(
        "  Kernel: {}",
        host.kernel_version.as_deref().unwrap_or("<unavailable>")
    );
    println!(
        "  xnu build: {}",
        host.kernel_version
            .as_deref()
            .and_then(feature::parse_xnu_major)
            .map_or_else(|| "-".to_string(), |major| major.to_string())
    );
    println!("  Vector layout: {}", host.layout.name());
    println!("  Vector width: {} bytes", host.layout.vector_width());
    println!("  Canonical context: {} bytes", catalog.canonical_len());
}

#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
mod trap
{
    use std::sync::mpsc;
    use std::thread;

    use selfde_core::controller::ControllerState;
    use selfde_core::error::{SelfdeError, SelfdeResult};
    use selfde_core::feature;
    use selfde_core::platform::macos::{raise_breakpoint, MachKernel, MachThread};

    use super::info;

    pub(super) fn run() -> SelfdeResult<()>
    {
        let (id_tx, id_rx) = mpsc::channel();
        let (go_tx, go_rx) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("selfde trap worker".to_string())
            .spawn(move || {
                if id_tx.send(MachThread::current().id()).is_err() {
                    return;
                }
                if go_rx.recv().is_ok() {
                    raise_breakpoint();
                }
            })
            .map_err(SelfdeError::ThreadSpawn)?;

        let target = id_rx.recv().map_err(|_| SelfdeError::MonitorNotReady)?;
        let mut controller = ControllerState::init(MachKernel::new()).with_target(target);
        controller.start()?;
        info!(worker = %target, "Monitoring worker thread");

        go_tx.send(()).map_err(|_| SelfdeError::MonitorNotReady)?;
        let record = controller.wait_for_exception()?;
        println!("Exception: {record}");
        println!("  Signal: {}", record.signal_number());

        let thread = MachThread::new(record.thread);
        let context = thread.capture_context(feature::vector_layout())?;
        println!("  rip: {:#018x}", context.instruction_pointer());
        println!("  rsp: {:#018x}", context.stack_pointer());
        println!("  rflags: {:#018x}", context.flags());
        println!("  trapno: {}", context.trap_number());

        thread.resume()?;
        worker
            .join()
            .map_err(|_| SelfdeError::Unsupported("trap worker panicked"))?;
        println!("Worker resumed and finished");
        Ok(())
    }
}

#[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
mod trap
{
    use selfde_core::error::{SelfdeError, SelfdeResult};

    pub(super) fn run() -> SelfdeResult<()>
    {
        Err(SelfdeError::Unsupported("exception monitoring needs macOS on x86-64"))
    }
}
