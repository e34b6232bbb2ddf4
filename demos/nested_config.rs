use argbind::derive::Reflect;
use argbind::{Binding, ClapRuntime, Error, Runtime};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Deserialize, Serialize, Reflect)]
#[serde(rename_all = "snake_case")]
enum Level {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Deserialize, Reflect)]
struct Database {
    #[argbind(default = "localhost")]
    host: String,
    #[argbind(default = 5432)]
    port: u16,
}

#[derive(Debug, Deserialize, Reflect)]
struct Server {
    /// The address to listen on.
    #[argbind(from_str, default = SocketAddr::from(([0, 0, 0, 0], 8080)))]
    listen: SocketAddr,
    database: Database,
    #[argbind(default = Level::Info)]
    level: Level,
}

#[derive(Debug, Deserialize, Reflect)]
struct Client {
    retries: u32,
    #[argbind(default = Level::Warn)]
    level: Level,
}

fn run(tokens: &[&str]) -> Result<(Server, Client), Error> {
    let mut runtime = ClapRuntime::new("nested_config").about("Two configurations, one command line.");
    let server = Binding::of::<Server>()?.prefix("server");
    let client = Binding::of::<Client>()?
        .prefix("client")
        .default_value("retries", 3);

    server.register(&mut runtime, tokens)?;
    client.register(&mut runtime, tokens)?;
    let parsed = runtime.parse_from(tokens)?;

    Ok((server.bind_as(&parsed)?, client.bind_as(&parsed)?))
}

fn main() {
    // $ nested_config --server-database-port 6543 --client-level debug
    let tokens: Vec<String> = env::args().skip(1).collect();
    let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();

    match run(&tokens) {
        Ok((server, client)) => println!("{server:#?}\n{client:#?}"),
        Err(Error::Cli(error)) => error.exit(),
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(error.exit_code());
        }
    }
}
