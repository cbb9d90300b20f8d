#[derive(Debug, Eq, PartialEq)]
pub enum Command {
    GenKey,
    Send,
    Listen,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Args {
    pub command: Option<Command>,
    pub key: Option<String>,
    pub address: Option<String>,
    pub short_help: bool,
    pub long_help: bool,
    pub version: bool,
}

impl Args {
    pub fn build_from_args<I>(mut cli_args: I) -> Result<Self, String>
    where
        I: Iterator<Item: AsRef<str> + ToString>,
    {
        let mut args = Self::default();

        while let Some(arg) = cli_args.next() {
            let some_command = args.command.is_some();

            match arg.as_ref() {
                "genkey" if !some_command => args.command = Some(Command::GenKey),
                "send" if !some_command => args.command = Some(Command::Send),
                "listen" if !some_command => args.command = Some(Command::Listen),
                "-k" | "--key" => {
                    let Some(key) = cli_args.next() else {
                        return Err("Missing value for '--key'".to_string());
                    };
                    args.key = Some(key.to_string());
                }
                "-a" | "--addr" => {
                    let Some(address) = cli_args.next() else {
                        return Err("Missing value for '--addr'".to_string());
                    };
                    args.address = Some(address.to_string());
                }
                "-h" => args.short_help = true,
                "--help" => args.long_help = true,
                "-V" | "--version" => args.version = true,
                unknown => {
                    return Err(format!("Unknown argument: '{unknown}'"));
                }
            }
        }

        Ok(args)
    }
}
