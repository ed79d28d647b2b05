//! TableKV CLI Client
//!
//! Command-line interface for interacting with TableKV.
//!
//! ```text
//! tablekv-cli users set name Alice     # one request
//! tablekv-cli                          # interactive, one request per line
//! ```

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::Parser;
use tablekv::protocol::{parse_request, Request};

/// TableKV CLI
#[derive(Parser, Debug)]
#[command(name = "tablekv-cli")]
#[command(about = "CLI for the TableKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    server: String,

    /// Request to send, e.g. `users get name`; omit for interactive mode
    #[arg(trailing_var_arg = true)]
    request: Vec<String>,
}

struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one line and read the single-line reply
    fn send(&mut self, line: &str) -> io::Result<String> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        Ok(reply.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            return ExitCode::FAILURE;
        }
    };

    let result = if args.request.is_empty() {
        interactive(&mut client)
    } else {
        let line = match parse_request(&args.request.join(" ")) {
            Request::Invalid => args.request.join(" "),
            request => request.to_string(),
        };
        client.send(&line).map(|reply| println!("{}", reply))
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn interactive(client: &mut Client) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "tablekv> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = client.send(line)?;
        println!("{}", reply);

        if parse_request(line) == Request::Quit {
            return Ok(());
        }
    }
}
