pub mod cli;
pub mod ui;

use std::io::{self, BufRead, Read, Write};
use std::net::{TcpListener, TcpStream};

use base64::prelude::{BASE64_STANDARD, Engine as _};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox};

use ppenc::{
    Bootstrap, ChaCha8Rng, Error, HEADER_LEN, RESPONSE_MAC_LEN, Receiver, Sender,
    verify_response_mac,
};

use ui::color::Color;

// Demo bootstrap material. The salts are the long-lived secrets both demo
// peers share; everything else is generated per session.
const DEMO_HEADER_SALT: [u8; 16] = [
    69, 59, 193, 12, 6, 158, 6, 102, 159, 66, 169, 195, 243, 57, 49, 167,
];
const DEMO_BODY_SALT: [u8; 16] = [
    225, 47, 207, 136, 141, 36, 224, 15, 163, 142, 89, 53, 51, 97, 249, 149,
];
const DEMO_TOKEN: &[u8; 100] =
    b"00.70f78f37bc36973269cd3b044ff15ec46f11c618ea6909452526c46d9173a059.e4f102910b3fea0cacba1923aad556ec";

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

pub fn genkey() -> Result<(), i32> {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    let key = SecretBox::new(Box::new(key));

    println!("{}", BASE64_STANDARD.encode(key.expose_secret()));

    Ok(())
}

pub fn send(args: &cli::Args) -> Result<(), i32> {
    let Some(key) = &args.key else {
        eprintln!("{}", Color::error("Missing sender key (-k)."));
        return Err(2);
    };
    let key = match parse_key(key) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("{}", Color::error(&err.to_string()));
            return Err(2);
        }
    };

    let address = args.address.as_deref().unwrap_or(DEFAULT_ADDR);
    if let Err(err) = run_initiator(address, &key) {
        eprintln!("{}", Color::error(&err.to_string()));
        return Err(1);
    }

    Ok(())
}

pub fn listen(args: &cli::Args) -> Result<(), i32> {
    let address = args.address.as_deref().unwrap_or(DEFAULT_ADDR);
    if let Err(err) = run_responder(address) {
        eprintln!("{}", Color::error(&err.to_string()));
        return Err(1);
    }

    Ok(())
}

fn parse_key(key: &str) -> ppenc::Result<SecretBox<[u8; 32]>> {
    let key = BASE64_STANDARD
        .decode(key)
        .map_err(|reason| Error::Base64Decode(reason.to_string()))?;
    let key: [u8; 32] = key
        .try_into()
        .map_err(|_| Error::Other("The key must decode to 32 bytes.".to_string()))?;
    Ok(SecretBox::new(Box::new(key)))
}

/// Demo initiator: handshake, then one frame per line of standard input.
fn run_initiator(address: &str, key: &SecretBox<[u8; 32]>) -> ppenc::Result<()> {
    let mut stream = TcpStream::connect(address)
        .map_err(|e| Error::Other(format!("Could not connect to {address}: {e}")))?;

    write_all(&mut stream, DEMO_TOKEN)?;

    let mut rng_nonce = [0u8; 8];
    rand::rng().fill_bytes(&mut rng_nonce);
    let mut rng = ChaCha8Rng::new(key.expose_secret(), &rng_nonce);

    let mut header_rng_nonce = [0u8; 12];
    rng.fill_bytes(&mut header_rng_nonce);
    write_all(&mut stream, &header_rng_nonce)?;

    let mut header_state_init = [0u8; 32];
    read_exact(&mut stream, &mut header_state_init)?;
    let mut body_state0 = [0u8; 32];
    read_exact(&mut stream, &mut body_state0)?;

    let bootstrap = Bootstrap {
        header_salt: DEMO_HEADER_SALT,
        header_state_init,
        header_rng_nonce,
        body_salt: DEMO_BODY_SALT,
        body_state0,
    };
    let mut sender = Sender::new(rng, &bootstrap);

    println!(
        "{}",
        Color::success(&format!("Session established with {address}."))
    );

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| Error::Read(e.to_string()))?;
        let body_len = line.len();

        let mut frame = vec![0u8; HEADER_LEN + ppenc::body_len_padded(body_len)];
        frame[HEADER_LEN..HEADER_LEN + body_len].copy_from_slice(line.as_bytes());

        let (header, body) = frame.split_at_mut(HEADER_LEN);
        let header: &mut [u8; HEADER_LEN] = header.try_into().unwrap();
        let (_, expected_mac) = sender.new_msg(header, body, body_len);

        write_all(&mut stream, &frame)?;

        let mut response_mac = [0u8; RESPONSE_MAC_LEN];
        read_exact(&mut stream, &mut response_mac)?;
        verify_response_mac(&expected_mac, &response_mac)?;

        println!(
            "{} {body_len} bytes (mac {}).",
            Color::success("Delivered"),
            hex_digest(&response_mac)
        );
    }

    Ok(())
}

/// Demo responder: serves a single session on one connection.
fn run_responder(address: &str) -> ppenc::Result<()> {
    let listener = TcpListener::bind(address)
        .map_err(|e| Error::Other(format!("Could not bind {address}: {e}")))?;
    println!("Listening on {address}.");

    let (mut stream, peer) = listener
        .accept()
        .map_err(|e| Error::Other(format!("Could not accept connection: {e}")))?;
    println!("Connection from {peer}.");

    let mut token = [0u8; DEMO_TOKEN.len()];
    read_exact(&mut stream, &mut token)?;
    println!("Token: {}", String::from_utf8_lossy(&token));

    let mut header_rng_nonce = [0u8; 12];
    read_exact(&mut stream, &mut header_rng_nonce)?;

    let mut header_state_init = [0u8; 32];
    rand::rng().fill_bytes(&mut header_state_init);
    let mut body_state0 = [0u8; 32];
    rand::rng().fill_bytes(&mut body_state0);
    write_all(&mut stream, &header_state_init)?;
    write_all(&mut stream, &body_state0)?;

    let bootstrap = Bootstrap {
        header_salt: DEMO_HEADER_SALT,
        header_state_init,
        header_rng_nonce,
        body_salt: DEMO_BODY_SALT,
        body_state0,
    };
    let mut receiver = Receiver::new(&bootstrap);

    println!("{}", Color::success("Session established."));

    loop {
        let mut raw_header = [0u8; HEADER_LEN];
        match stream.read_exact(&mut raw_header) {
            Ok(()) => {}
            // The peer hanging up between frames is a normal end of session.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                println!("{}", Color::warning("Peer closed the session."));
                break;
            }
            Err(e) => return Err(Error::Read(e.to_string())),
        }

        let header = receiver.read_header(&mut raw_header)?;

        let mut body = vec![0u8; header.body_len_padded()];
        read_exact(&mut stream, &mut body)?;
        let response_mac = receiver.read_body(&header, &mut body)?;

        write_all(&mut stream, &response_mac)?;

        println!(
            "[{}] {}",
            header.seq_num,
            String::from_utf8_lossy(&body[..header.body_len as usize])
        );
    }

    Ok(())
}

fn read_exact(stream: &mut TcpStream, buf: &mut [u8]) -> ppenc::Result<()> {
    stream
        .read_exact(buf)
        .map_err(|e| Error::Read(e.to_string()))
}

fn write_all(stream: &mut TcpStream, buf: &[u8]) -> ppenc::Result<()> {
    stream
        .write_all(buf)
        .map_err(|e| Error::Write(e.to_string()))
}

fn hex_digest(mac: &[u8; RESPONSE_MAC_LEN]) -> String {
    mac.iter().map(|byte| format!("{byte:02x}")).collect()
}
