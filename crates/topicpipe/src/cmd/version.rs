use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("topicpipe {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: topicpipe");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("TOPICPIPE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("TOPICPIPE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("default_port: {}", topicpipe::DEFAULT_PORT);
    println!("wire_greeting: {}", String::from_utf8_lossy(topicpipe::transport::GREETING));
    println!("features: cli=true");

    Ok(SUCCESS)
}
