use std::error::Error;

use termcolor::ColorChoice;
use termcolor::StandardStream;

pub(crate) type GenericResult<T> = std::result::Result<T, Box<dyn Error>>;

macro_rules! error {
    ($format_string: expr $(, $argument: expr)*) => { Err(From::from(format!($format_string $(, $argument)*))) };
}

macro_rules! warning {
    ($format_string: expr $(, $argument: expr)*) => {{
        eprint!("warning: "); eprintln!($format_string $(, $argument)*)
    }};
}

pub(crate) fn stdout() -> StandardStream {
    let is_tty = unsafe { libc::isatty(libc::STDOUT_FILENO) } != 0;
    let color_choice = if is_tty { ColorChoice::Always } else { ColorChoice::Never };
    StandardStream::stdout(color_choice)
}
