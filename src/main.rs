use std::env;
use std::process::ExitCode;

use armaquery::{PlayerRecord, QueryClient, QueryConfig, QueryError, ServerAddress, ServerStatus};
use env_logger::Env;
use log::error;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let Some(target) = env::args().nth(1) else {
        eprintln!("usage: armaquery <host:query-port>");
        return ExitCode::from(2);
    };

    match run(&target).await {
        Ok(status) => {
            print_status(&status);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(target: &str) -> Result<ServerStatus, QueryError> {
    let address: ServerAddress = target.parse()?;
    let mut client = QueryClient::connect(&address, QueryConfig::from_env()).await?;
    Ok(client.fetch_status().await)
}

fn print_status(status: &ServerStatus) {
    let Some(info) = status.info() else {
        println!("offline");
        return;
    };

    println!("{}", info.name);
    println!("map:     {}", info.map);
    println!("mission: {}", info.mission);
    println!("players: {}/{}", info.player_count, info.player_limit);

    let mut players: Vec<&PlayerRecord> = status.players().iter().collect();
    players.sort_by_cached_key(|p| p.name.to_lowercase());
    for player in players {
        let minutes = player.connected().as_secs() / 60;
        println!(
            "  {:<24} {:>4}  {:02}:{:02}",
            player.name,
            player.score,
            minutes / 60,
            minutes % 60
        );
    }
}
