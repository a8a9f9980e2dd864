//!
//! src/main.rs  Oct 18th, 2026
//!
//! Line driven front end over the client core. Any line is a search
//! query (sent as typed, empty included); `:d N` downloads row N,
//! `:l` redraws, `:q` quits once in-flight downloads settle
//!

use disco_client::{DiscoClient, DiscoError, View, config, logging};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

enum Command<'a> {
    Search(&'a str),
    Download(usize),
    List,
    Quit,
    Unknown(&'a str)
}

fn parse(line: &str) -> Command<'_> {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Search(line);
    };
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("q"), None) => Command::Quit,
        (Some("l"), None) => Command::List,
        (Some("d"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Download(n - 1),
            _ => Command::Unknown(line)
        },
        _ => Command::Unknown(line)
    }
}

fn render(view: &View) {
    if view.searching {
        println!("searching...");
    }
    if view.rows.is_empty() {
        println!("No results found");
        return;
    }
    for (i, row) in view.rows.iter().enumerate() {
        println!("{:>3}. {} - {} [{}]", i + 1, row.track.title, row.track.artist, row.state);
    }
}

/// Redraws whenever the list, a search or the set of running downloads
/// changes
async fn render_loop(client: DiscoClient) {
    let mut tracks = client.store().subscribe();
    let mut searching = client.search().subscribe();
    let mut running = client.downloads().subscribe();
    loop {
        tokio::select! {
            r = tracks.changed() => if r.is_err() { break },
            r = searching.changed() => if r.is_err() { break },
            r = running.changed() => if r.is_err() { break },
        }
        render(&client.view());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), DiscoError> {
    let cfgs = config::load_config()?;
    let _logger = logging::init_logging(&cfgs.logging)?;

    info!(
        service = env!("CARGO_PKG_NAME"),
        version = %env!("CARGO_PKG_VERSION"),
        api = %cfgs.api.base_url,
        downloads = %cfgs.downloads.dir.display(),
        "starting"
    );

    let client = DiscoClient::new(&cfgs)?;
    let renderer = tokio::spawn(render_loop(client.clone()));
    render(&client.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Command::Search(query) => {
                client.submit(query).await;
            },
            Command::Download(index) => match client.tracks().get(index) {
                Some(track) => {
                    let _ = client.download(track.clone());
                },
                None => println!("no row {}", index + 1)
            },
            Command::List => render(&client.view()),
            Command::Quit => break,
            Command::Unknown(raw) => println!("unknown command {raw:?}")
        }
    }

    client.wait_idle().await;
    renderer.abort();
    render(&client.view());
    info!("exit");
    Ok(())
}
