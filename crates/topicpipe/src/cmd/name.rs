use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use topicpipe::channel::generate_name;

use crate::cmd::NameArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_raw, OutputFormat};

#[derive(Serialize)]
struct NamesOutput {
    names: Vec<String>,
}

pub fn run(args: NameArgs, format: OutputFormat) -> CliResult<i32> {
    let names = match args.seed {
        Some(seed) => generate(&mut StdRng::seed_from_u64(seed), args.count),
        None => generate(&mut rand::thread_rng(), args.count),
    };

    match format {
        OutputFormat::Json => {
            let out = NamesOutput { names };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty | OutputFormat::Raw => {
            for name in &names {
                print_raw(name);
            }
        }
    }

    Ok(SUCCESS)
}

fn generate<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    (0..count).map(|_| generate_name(rng)).collect()
}
