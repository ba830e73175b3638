//! `rsrc-bin` is the executable front-end over [`rsrc_resource`]: list and
//! dump resources out of a classic Mac OS resource fork.

mod error;

use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process,
};

use argh::FromArgs;
use error::Error;
use rsrc_io::read_resource_fork;
use rsrc_resource::{fork::type_name, sound, soundmusicsys, tune, types, DecompressionFlags, ResourceFile, ResourceType};

/// Inspect and decode resources out of a classic Mac OS resource fork.
#[derive(Debug, FromArgs)]
struct Rsrc {
    /// explain a particular error based on its code (of kind `E...`).
    #[argh(option)]
    explain: Option<String>,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    List(ListCommand),
    Dump(DumpCommand),
}

/// List every resource in a fork, grouped by type.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "list")]
struct ListCommand {
    /// path to the resource fork to read.
    #[argh(positional)]
    file: PathBuf,
}

/// Decode one resource and write it to stdout or a file.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "dump")]
struct DumpCommand {
    /// path to the resource fork to read.
    #[argh(positional)]
    file: PathBuf,

    /// four-character resource type tag, e.g. `snd ` (quote it to keep the
    /// trailing space).
    #[argh(positional)]
    kind: String,

    /// resource id.
    #[argh(positional)]
    id: i16,

    /// write the decoded bytes here instead of stdout.
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// never attempt decompression; dump the raw (possibly still
    /// compressed) bytes.
    #[argh(switch)]
    no_decompress: bool,
}

impl Rsrc {
    /// Creates a new `Self` based on [`std::env::args_os`].
    fn new() -> Result<Self, Error> {
        let arguments = env::args_os()
            .map(OsString::into_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|argument| Error::InvalidArgumentEncoding(argument.to_string_lossy().to_string()))?;

        if arguments.is_empty() {
            return Err(Error::ProgramNameIsMissing);
        }

        let command = Path::new(&arguments[0]).file_name().and_then(|file_name| file_name.to_str()).unwrap_or(&arguments[0]);

        let arguments = arguments.iter().skip(1).map(|argument| argument.as_str()).collect::<Vec<_>>();

        match Rsrc::from_args(&[command], &arguments) {
            Ok(rsrc) => Ok(rsrc),
            Err(early_exit) => match early_exit.status {
                Ok(()) => {
                    println!("{}", early_exit.output);
                    process::exit(0);
                }
                Err(()) => Err(Error::CommandLine(early_exit.output.trim().to_string())),
            },
        }
    }
}

fn parse_type_tag(raw: &str) -> Result<ResourceType, Error> {
    let bytes = raw.as_bytes();
    if bytes.len() != 4 {
        return Err(Error::CommandLine(format!("resource type '{raw}' must be exactly 4 characters, got {}", bytes.len())));
    }

    Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn run_list(command: ListCommand) -> Result<(), Error> {
    let bytes = read_resource_fork(&command.file)?;
    let file = ResourceFile::parse(&bytes)?;

    for (kind, id) in file.all_resources() {
        println!("{} {id}", type_name(kind));
    }

    Ok(())
}

/// Decode a resource's bytes into the most useful representation this
/// crate knows for its type; falls back to the raw payload for any type
/// without a dedicated decoder.
fn decode_for_dump(kind: ResourceType, data: &[u8]) -> Result<Vec<u8>, Error> {
    match &kind {
        b"snd " => {
            let sound = sound::parse(data)?;
            Ok(sound::to_wav(&sound)?)
        }
        b"Tune" => Ok(tune::to_midi(data)?),
        b"csnd" => Ok(soundmusicsys::decode_csnd(data)?),
        b"esnd" => Ok(soundmusicsys::decode_esnd(data)?),
        b"ESnd" => Ok(soundmusicsys::decode_esnd_capital(data)?),
        b"SMSD" => Ok(soundmusicsys::decode_smsd(data)?),
        b"cmid" => Ok(soundmusicsys::decode_cmid(data)?),
        b"emid" => Ok(soundmusicsys::decode_emid(data)),
        b"ecmi" => Ok(soundmusicsys::decode_ecmi(data)?),
        b"STR " => Ok(types::decode_strings(data, false)?.join("\n").into_bytes()),
        b"STR#" => Ok(types::decode_strings(data, true)?.join("\n").into_bytes()),
        b"TEXT" => Ok(types::decode_text(data).plain.into_bytes()),
        _ => Ok(data.to_vec()),
    }
}

fn run_dump(command: DumpCommand) -> Result<(), Error> {
    let bytes = read_resource_fork(&command.file)?;
    let mut file = ResourceFile::parse(&bytes)?;
    let kind = parse_type_tag(&command.kind)?;

    let flags = if command.no_decompress { DecompressionFlags::from(rsrc_resource::DecompressionFlag::Disabled) } else { DecompressionFlags::empty() };

    let resource = file.get_resource(kind, command.id, flags)?;
    let decoded = decode_for_dump(kind, &resource.data)?;

    match command.output {
        Some(path) => fs::write(path, decoded)?,
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&decoded)?;
        }
    }

    Ok(())
}

fn main() -> miette::Result<()> {
    env_logger::init();

    Error::install_and_configure()?;

    let rsrc = Rsrc::new()?;

    if let Some(error_code) = rsrc.explain {
        println!("{}", Error::explain(&error_code)?);
        return Ok(());
    }

    match rsrc.command {
        Some(Command::List(command)) => run_list(command)?,
        Some(Command::Dump(command)) => run_dump(command)?,
        None => {
            eprintln!("no subcommand given; try `rsrc --help`");
            process::exit(1);
        }
    }

    Ok(())
}
