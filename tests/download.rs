use doodlegan::data::quickdraw;
use doodlegan::Error;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

mod common;

/// Minimal HTTP/1.1 server on 127.0.0.1. Paths found in `files` get a 200
/// with that body, everything else a 404. With `pace` set, the body is sent
/// one byte at a time with that pause between bytes.
fn serve(files: HashMap<String, Vec<u8>>, pace: Option<Duration>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            respond(stream, &files, pace);
        }
    });
    format!("http://{addr}")
}

fn respond(mut stream: TcpStream, files: &HashMap<String, Vec<u8>>, pace: Option<Duration>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) | Err(_) => break,
            Ok(_) if header == "\r\n" => break,
            Ok(_) => {}
        }
    }
    let path = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
    let (status, body) = match files.get(&path) {
        Some(body) => ("200 OK", body.clone()),
        None => ("404 Not Found", b"not found".to_vec()),
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    match pace {
        None => {
            let _ = stream.write_all(&body);
        }
        Some(pause) => {
            for byte in body {
                if stream.write_all(&[byte]).and_then(|()| stream.flush()).is_err() {
                    return;
                }
                thread::sleep(pause);
            }
        }
    }
    let _ = stream.flush();
}

#[test]
fn writes_each_category_under_a_trimmed_base() {
    let apple: Vec<u8> = (0..=255).collect();
    let banana = b"\x93NUMPY banana bytes".to_vec();
    let mut files = HashMap::new();
    files.insert("/bitmap/apple.npy".to_string(), apple.clone());
    files.insert("/bitmap/banana.npy".to_string(), banana.clone());
    let host = serve(files, None);

    let dir = common::scratch_dir("download_ok").join("nested").join("deeper");
    let base = format!("{host}/bitmap/");
    let paths = quickdraw::download(&dir, &base, &["apple", "banana"]).unwrap();

    assert_eq!(paths, vec![dir.join("apple.npy"), dir.join("banana.npy")]);
    assert_eq!(std::fs::read(&paths[0]).unwrap(), apple);
    assert_eq!(std::fs::read(&paths[1]).unwrap(), banana);
    assert!(!dir.join("apple.npy.part").exists());
}

#[test]
fn missing_category_is_a_status_error() {
    let mut files = HashMap::new();
    files.insert("/bitmap/apple.npy".to_string(), vec![1, 2, 3]);
    let host = serve(files, None);

    let dir = common::scratch_dir("download_404");
    let base = format!("{host}/bitmap");
    let err = quickdraw::download(&dir, &base, &["apple", "pear"]).unwrap_err();

    match err {
        Error::DownloadStatus { url, status } => {
            assert_eq!(status, 404);
            assert_eq!(url, format!("{host}/bitmap/pear.npy"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read(dir.join("apple.npy")).unwrap(), vec![1, 2, 3]);
    assert!(!dir.join("pear.npy").exists());
}

#[test]
fn slow_body_is_not_cut_off() {
    // Longer than reqwest's default 30 second client timeout.
    let body: Vec<u8> = (0..34).collect();
    let mut files = HashMap::new();
    files.insert("/grapes.npy".to_string(), body.clone());
    let host = serve(files, Some(Duration::from_secs(1)));

    let dir = common::scratch_dir("download_slow");
    let started = Instant::now();
    let paths = quickdraw::download(&dir, &host, &["grapes"]).unwrap();

    assert!(started.elapsed() >= Duration::from_secs(30));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), body);
}
