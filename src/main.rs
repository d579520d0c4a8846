use fallible_iterator::FallibleIterator;
use clap::{Parser, Subcommand};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use memmap2::Mmap;

use std::path::{Path, PathBuf};
use std::process::exit;
use std::io::{BufWriter, Read, Write};
use std::fs::File;

use svr4cpio::{ArchiveReader, ArchiveWriter};

type Result<T> = anyhow::Result<T>;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

#[derive(Parser)]
struct CmdArgs {
    #[clap(subcommand)]
    commands: Commands
}

#[derive(Subcommand)]
enum Commands {
    /// Create a cpio archive from a directory
    Ar {
        /// Path to the directory to archive
        directory_path: PathBuf,

        /// Output path for created archive
        output_path: PathBuf,

        /// Compress the archive in gzip format
        #[clap(short='g', long, action)]
        gzip: bool
    },
    /// Extract a single file from a cpio archive
    Cat {
        /// Path to the cpio archive
        archive_path: PathBuf,

        /// Path to the file to extract
        internal_path: String,
    },
    /// List the files in a cpio archive
    Ls {
        /// Path to the cpio archive to inspect
        archive_path: PathBuf,
    },
}

fn collect_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .collect()
}

/// Plain archives are read straight from the mapping, gzip ones through a decoder
fn archive_reader(mem: &[u8]) -> ArchiveReader<Box<dyn Read + '_>> {
    let reader: Box<dyn Read + '_> = if mem.starts_with(GZIP_MAGIC) {
        Box::new(GzDecoder::new(mem))
    } else {
        Box::new(mem)
    };
    ArchiveReader::new(reader)
}

fn write_archive<W: Write>(writer: W, directory_path: &Path) -> Result<W> {
    let mut archive = ArchiveWriter::new(writer);

    let files = collect_files(directory_path);
    for file in files {
        if let Some(file_str) = file.to_str() {
            if let Some(directory_path_str) = directory_path.to_str() {
                let internal_path = file_str
                    .trim_start_matches(directory_path_str)
                    .trim_start_matches('/');
                println!("{}", &internal_path);
                archive.append_path(&file, internal_path)?;
            }
        }
    }

    Ok(archive.finish()?)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = CmdArgs::parse();
    match args.commands {
        Commands::Ar { directory_path, output_path, gzip } => {
            let out_fp = File::create(&output_path)?;
            if gzip {
                let encoder = GzEncoder::new(out_fp, Compression::default());
                write_archive(encoder, &directory_path)?.finish()?;
            } else {
                write_archive(BufWriter::new(out_fp), &directory_path)?;
            }
        },
        Commands::Ls { archive_path } => {
            let archive = File::open(archive_path)?;
            let mmap = unsafe { Mmap::map(&archive) }?;

            let mut iter = archive_reader(&mmap);
            while let Some(entry) = iter.next()? {
                let header = &entry.header;
                if header.is_symlink() {
                    println!(
                        "{} {:>2} {:>4} {:>4} {:>8} {} -> {}",
                        header.mode_str(),
                        header.nlink,
                        header.uid,
                        header.gid,
                        header.link_target.len(),
                        header.name_lossy(),
                        String::from_utf8_lossy(&header.link_target),
                    );
                } else {
                    println!(
                        "{} {:>2} {:>4} {:>4} {:>8} {}",
                        header.mode_str(),
                        header.nlink,
                        header.uid,
                        header.gid,
                        header.size,
                        header.name_lossy(),
                    );
                }
            }
        },
        Commands::Cat { archive_path, internal_path } => {
            let archive = File::open(archive_path)?;
            let mmap = unsafe { Mmap::map(&archive) }?;

            let mut iter = archive_reader(&mmap);
            while let Some(entry) = iter.next()? {
                if entry.header.name != internal_path.as_bytes() {
                    continue;
                }

                if !entry.header.is_file() {
                    eprintln!("Cat is only supported for regular files!");
                    exit(1);
                }

                std::io::stdout().write_all(&entry.body)?;
                return Ok(())
            }
            eprintln!("No file found in archive for path: '{internal_path}'");
            exit(1);
        },
    }

    Ok(())
}
