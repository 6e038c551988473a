use clap::Parser;
use rtsp_client::RtspClient;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(
    name = "rtsp-client",
    about = "RTSP client that receives and decodes a Motion-JPEG stream"
)]
struct Args {
    /// Server IP address
    #[arg(long, short)]
    address: String,

    /// Server RTSP port
    #[arg(long, short, default_value_t = 8554)]
    port: u16,

    /// Stream path on the server
    #[arg(long, default_value = "/mjpeg/1")]
    path: String,

    /// Local port for RTP
    #[arg(long, default_value_t = 5000)]
    rtp_port: u16,

    /// Local port for RTCP
    #[arg(long, default_value_t = 5001)]
    rtcp_port: u16,

    /// Seconds to receive before disconnecting (0 = until Enter)
    #[arg(long, short, default_value_t = 0)]
    duration: u64,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut client = RtspClient::new();

    let started = client
        .connect(&args.address, args.port, &args.path)
        .and_then(|_| client.describe())
        .and_then(|_| client.setup(args.rtp_port, args.rtcp_port))
        .and_then(|_| client.play());
    if let Err(e) = started {
        eprintln!("Failed to start stream: {}", e);
        client.disconnect();
        return;
    }

    let stop = Arc::new(AtomicBool::new(false));
    if args.duration == 0 {
        println!(
            "Receiving rtsp://{}:{}{}, press Enter to stop",
            args.address, args.port, args.path
        );
        let s = stop.clone();
        thread::spawn(move || {
            let mut input = String::new();
            let _ = io::stdin().read_line(&mut input);
            s.store(true, Ordering::SeqCst);
        });
    }

    let deadline = (args.duration > 0).then(|| Instant::now() + Duration::from_secs(args.duration));
    let mut frames = 0u64;
    while !stop.load(Ordering::SeqCst) && deadline.is_none_or(|d| Instant::now() < d) {
        if let Some(frame) = client.take_frame() {
            frames += 1;
            tracing::info!(frame = frames, width = frame.width, height = frame.height, "frame");
        }
        thread::sleep(Duration::from_millis(10));
    }

    let stats = client.stats();
    client.disconnect();
    println!(
        "{} frames shown, {} completed, {} dropped, {} decode failures",
        frames, stats.frames_completed, stats.frames_dropped, stats.decode_failures
    );
}
