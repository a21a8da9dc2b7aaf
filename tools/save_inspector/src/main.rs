use std::path::PathBuf;
use std::process::ExitCode;

use gabbro_persist::save::decode_save;

fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1).map(PathBuf::from) else {
        eprintln!("Usage: save_inspector <world.wld>");
        return ExitCode::from(2);
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    match decode_save(&bytes) {
        Ok(Some(save)) => {
            println!("file:            {}", path.display());
            println!("seed:            {}", save.seed);
            println!("modified chunks: {}", save.chunks.len());
            for (pos, chunk) in &save.chunks {
                let non_air = chunk.blocks.iter().filter(|block| block.0 != 0).count();
                println!(
                    "  chunk ({:>5}, {:>2}, {:>5})  {non_air:>5} non-air blocks",
                    pos.x, pos.y, pos.z
                );
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("unrecognized save format version; nothing to inspect");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("corrupt save file: {err}");
            ExitCode::FAILURE
        }
    }
}
