mod cli;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(command_line_interface.log_level())
        .init();
    command_line_interface.run()
}
