use std::{env::args, process::exit};

fn main() {
    env_logger::init();

    let filter = match args().nth(1) {
        Some(filter) => filter,
        None => {
            eprintln!("usage: cli <filter>");
            exit(2);
        }
    };

    let scheme = dfilter::Scheme! {
        eth: Protocol,
        eth.addr: Ether,
        eth.type: Int,
        ip: Protocol,
        ip.src: Ip,
        ip.dst: Ip,
        ip.ttl: Int,
        tcp: Protocol,
        tcp.port: Int,
        tcp.flags.syn: Bool,
        udp.port: Int,
        frame.len: Int,
        frame.time_delta: Float,
        http.host: Bytes,
        http.user_agent: Bytes,
    };

    match scheme.parse(&filter) {
        Ok(ast) => match serde_json::to_string_pretty(&ast) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("{}", err);
                exit(1);
            }
        },
        Err(err) => {
            print!("{}", err);
            exit(1);
        }
    }
}
