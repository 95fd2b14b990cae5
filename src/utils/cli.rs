use clap::Parser;
use clap::error::ErrorKind;

/// Parses command-line arguments, exiting with status 1 on usage errors.
///
/// `--help` and `--version` keep clap's own behaviour (print and exit 0).
pub fn parse_args<T: Parser>() -> T {
    match T::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    }
}
