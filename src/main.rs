mod cmd;

use std::env;
use std::process;

use lessify::Pager;

use cmd::cli;

fn main() {
    let args = match cli::Args::build_from_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("fatal: {err}.");
            println!("Try '{bin} -h' for help.", bin = env!("CARGO_BIN_NAME"));
            process::exit(2);
        }
    };

    if args.long_help {
        long_help();
    } else if args.short_help {
        short_help();
    } else if args.version {
        version();
    } else if let Some(ref command) = args.command {
        if let Err(code) = match command {
            cli::Command::GenKey => cmd::genkey(),
            cli::Command::Send => cmd::send(&args),
            cli::Command::Listen => cmd::listen(&args),
        } {
            process::exit(code);
        }
    } else {
        // No arguments.
        short_help();
    }
}

fn short_help() {
    println!("{}", short_help_message());
    println!(
        "For full help, see `{bin} --help`.",
        bin = env!("CARGO_BIN_NAME")
    );
}

fn short_help_message() -> String {
    format!(
        "\
{description}

Usage: {bin} [<options>] <command>

Commands:
  genkey                 Generate a sender RNG key
  send                   Connect and send stdin lines as messages
  listen                 Serve one demo session

Options:
  -k, --key <key>        Base64 sender RNG key (send)
  -a, --addr <address>   Peer or bind address (default 127.0.0.1:8080)
  -h, --help             Show this message and exit
  -V, --version          Show the version and exit
",
        description = env!("CARGO_PKG_DESCRIPTION"),
        bin = env!("CARGO_BIN_NAME"),
    )
}

#[allow(clippy::too_many_lines)]
fn long_help() {
    Pager::page_or_print(&format!(
        "\
{help}
What does {package} do?
  {package} speaks a session-oriented encrypted message transport. Two
  peers sharing bootstrap secrets exchange length-prefixed frames: a
  32-byte encrypted header followed by an encrypted, padded body. The
  receiver answers each frame with a 32-byte response MAC that proves
  receipt and body integrity.

  Every frame evolves the session: headers are masked with a running
  ChaCha20 keystream, bodies are enciphered with Threefish-512 under a
  per-block tweak schedule, and the body key can be ratcheted forward
  at any time with the receiver catching up on demand.

The demo:
  1. Run `{bin} listen` in one terminal.
  2. Run `{bin} send -k $({bin} genkey)` in another.
  3. Type lines into `send`; `listen` prints them and echoes response
     MACs back.

  The demo peers share fixed salts and exchange the per-session seeds
  over the wire, which stands in for a real handshake.
",
        help = short_help_message(),
        bin = env!("CARGO_BIN_NAME"),
        package = env!("CARGO_PKG_NAME"),
    ));
}

fn version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}
