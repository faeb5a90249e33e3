use clap::{arg, crate_version, Command};
use vitterflate::deflate;
use vitterflate::options::{Options, MAX_WINDOW_SIZE};

const RCH: &str = "unreachable was reached";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help = "Examples:
---------
Compress:  `vitterflate compress -i my_file -o my_file.zz`
Expand:    `vitterflate expand -i my_file.zz -o my_file`";

    let mut main_cmd = Command::new("vitterflate")
        .about("Compress and expand zlib/DEFLATE streams")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(
        Command::new("compress")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .arg(
                arg!(-w --window <SIZE> "sliding window size in bytes, up to 32768")
                    .required(false),
            )
            .arg(arg!(--stats "print per-token encoder statistics to stderr").required(false))
            .about("compress a file into a zlib stream"),
    );
    main_cmd = main_cmd.subcommand(
        Command::new("expand")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .arg(arg!(-z --"null-terminate" "append a trailing 0 byte if absent").required(false))
            .about("expand a zlib stream into a file"),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let window_size = match cmd.get_one::<String>("window") {
            Some(w) => w.parse::<usize>()?,
            None => MAX_WINDOW_SIZE,
        };
        let dat = std::fs::read(path_in)?;
        log::info!("compressing {} bytes from {}", dat.len(), path_in);
        let options = Options { window_size, ..Options::default() };

        #[cfg(feature = "statistics")]
        let compressed = if cmd.get_flag("stats") {
            let mut count = 0u64;
            let compressed = deflate::compress_with_stats(&dat, window_size, &options, &mut |stat| {
                count += 1;
                eprintln!("{:>8} bytes_in={:<8} ll={:<4} dist={:?}", count, stat.bytes_in, stat.ll_symbol, stat.dist_symbol);
            })?;
            compressed
        } else {
            deflate::compress(&dat, window_size, &options)?
        };
        #[cfg(not(feature = "statistics"))]
        let compressed = {
            if cmd.get_flag("stats") {
                log::warn!("--stats requires building with `--features statistics`; ignoring");
            }
            deflate::compress(&dat, window_size, &options)?
        };

        log::info!("wrote {} compressed bytes to {}", compressed.len(), path_out);
        std::fs::write(path_out, compressed)?;
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let options = Options {
            null_terminate: cmd.get_flag("null-terminate"),
            ..Options::default()
        };
        let dat = std::fs::read(path_in)?;
        log::info!("expanding {} bytes from {}", dat.len(), path_in);
        let expanded = deflate::decompress(&dat, &options)?;
        log::info!("wrote {} expanded bytes to {}", expanded.len(), path_out);
        std::fs::write(path_out, expanded)?;
    }

    Ok(())
}
