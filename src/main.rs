mod config;
mod display;
mod mqtt;
mod spectrum;
mod theme;
mod util;
mod waterfall;

use config::Config;
use display::{Display, InputEvent, SdlTileSurface, TileTextures};
use mqtt::{Command, MqttClient};
use sdl2::keyboard::Keycode;
use spectrum::SpectrumSource;
use theme::ThemeSet;
use util::FpsCounter;
use waterfall::Waterfall;

/// Most simulation steps to run per rendered frame before dropping time
const MAX_CATCHUP_STEPS: u32 = 8;

const MIN_ROWS_PER_SECOND: f32 = 1.0;
const MAX_ROWS_PER_SECOND: f32 = 240.0;

struct Args {
    width: u32,
    height: u32,
    vsync: bool,
    config_path: Option<String>,
    fft_size: Option<usize>,
    lines: Option<usize>,
}

fn print_usage() {
    println!("Usage: specfall [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -w, --width <PIXELS>      Window width (default: 1024)");
    println!("  -h, --height <PIXELS>     Window height (default: 600)");
    println!("  -r, --resolution <WxH>    Window size, e.g. 1280x720");
    println!("      --no-vsync            Disable VSync");
    println!("      --config <FILE>       Load settings from a JSON file");
    println!("      --fft <SIZE>          FFT size of the simulated source");
    println!("      --lines <ROWS>        Visible scrollback rows");
    println!("      --help                Show this help");
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        width: display::DEFAULT_WIDTH,
        height: display::DEFAULT_HEIGHT,
        vsync: true,
        config_path: None,
        fft_size: None,
        lines: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-w" | "--width" => {
                let v = iter.next().ok_or("--width requires a value")?;
                args.width = v.parse().map_err(|_| format!("invalid width: {}", v))?;
            }
            "-h" | "--height" => {
                let v = iter.next().ok_or("--height requires a value")?;
                args.height = v.parse().map_err(|_| format!("invalid height: {}", v))?;
            }
            "-r" | "--resolution" => {
                let v = iter.next().ok_or("--resolution requires a value")?;
                let (w, h) = v
                    .split_once(['x', 'X'])
                    .ok_or_else(|| format!("invalid resolution (expected WxH): {}", v))?;
                args.width = w.parse().map_err(|_| format!("invalid width: {}", w))?;
                args.height = h.parse().map_err(|_| format!("invalid height: {}", h))?;
            }
            "--no-vsync" => args.vsync = false,
            "--config" => {
                args.config_path = Some(iter.next().ok_or("--config requires a value")?);
            }
            "--fft" => {
                let v = iter.next().ok_or("--fft requires a value")?;
                args.fft_size = Some(v.parse().map_err(|_| format!("invalid fft size: {}", v))?);
            }
            "--lines" => {
                let v = iter.next().ok_or("--lines requires a value")?;
                args.lines = Some(v.parse().map_err(|_| format!("invalid lines: {}", v))?);
            }
            "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(args)
}

fn select_theme(theme_index: &mut usize, n: usize, themes: &ThemeSet) {
    if n < themes.len() {
        *theme_index = n;
    }
}

fn main() -> Result<(), String> {
    let args = parse_args().map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    let mut config = match &args.config_path {
        Some(path) => Config::load(path)
            .map_err(|e| format!("Failed to load config '{}': {}", path, e))?,
        None => Config::default(),
    };
    if let Some(fft) = args.fft_size {
        config.fft_size = fft;
    }
    if let Some(lines) = args.lines {
        config.waterfall_lines = lines;
    }
    if config.fft_size < 2 {
        return Err(format!("fft_size too small: {}", config.fft_size));
    }
    if config.waterfall_lines == 0 {
        return Err("waterfall_lines must be positive".to_string());
    }

    let (mut display, texture_creator) =
        Display::with_options("specfall", args.width, args.height, args.vsync)?;
    let mut tiles = TileTextures::new(&texture_creator);

    println!("specfall - scrolling spectrogram");
    println!(
        "  {}x{} window, {} bins x {} lines per tile, vsync {}",
        display.width(),
        display.height(),
        config.fft_size / 2,
        config.waterfall_lines,
        if args.vsync { "on" } else { "off" }
    );
    println!("Controls:");
    println!("  Esc/Q       quit");
    println!("  Space       pause / resume scrolling");
    println!("  Left/Right  previous / next theme");
    println!("  1-9         select theme directly");
    println!("  Up/Down     scroll speed up / down");

    let themes = ThemeSet::builtin();
    let mut theme_index = themes.index_of(&config.theme).unwrap_or_else(|| {
        eprintln!("Unknown theme '{}', using default", config.theme);
        0
    });

    let mut waterfall = Waterfall::new();
    waterfall.setup(config.fft_size, config.waterfall_lines);

    let mut source = SpectrumSource::new(waterfall.bins_per_tile(), 0x5EED);

    let mqtt_client = match &config.mqtt {
        Some(mqtt_cfg) => match MqttClient::new(&mqtt_cfg.host, mqtt_cfg.port, &mqtt_cfg.topic) {
            Ok(client) => Some(client),
            Err(e) => {
                eprintln!("MQTT disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let mut fps = FpsCounter::new(60);
    let mut rows_per_second = config
        .rows_per_second
        .clamp(MIN_ROWS_PER_SECOND, MAX_ROWS_PER_SECOND);
    let mut paused = false;
    let mut running = true;
    let mut accumulator = 0.0f32;
    let mut title_timer = 0.0f32;

    while running {
        let (dt, avg_fps) = fps.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => running = false,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape | Keycode::Q => running = false,
                    Keycode::Space => paused = !paused,
                    Keycode::Right => theme_index = (theme_index + 1) % themes.len(),
                    Keycode::Left => {
                        theme_index = (theme_index + themes.len() - 1) % themes.len()
                    }
                    Keycode::Up => {
                        rows_per_second =
                            (rows_per_second * 1.25).clamp(MIN_ROWS_PER_SECOND, MAX_ROWS_PER_SECOND)
                    }
                    Keycode::Down => {
                        rows_per_second =
                            (rows_per_second * 0.8).clamp(MIN_ROWS_PER_SECOND, MAX_ROWS_PER_SECOND)
                    }
                    Keycode::Num1 => select_theme(&mut theme_index, 0, &themes),
                    Keycode::Num2 => select_theme(&mut theme_index, 1, &themes),
                    Keycode::Num3 => select_theme(&mut theme_index, 2, &themes),
                    Keycode::Num4 => select_theme(&mut theme_index, 3, &themes),
                    Keycode::Num5 => select_theme(&mut theme_index, 4, &themes),
                    Keycode::Num6 => select_theme(&mut theme_index, 5, &themes),
                    Keycode::Num7 => select_theme(&mut theme_index, 6, &themes),
                    Keycode::Num8 => select_theme(&mut theme_index, 7, &themes),
                    Keycode::Num9 => select_theme(&mut theme_index, 8, &themes),
                    _ => {}
                },
            }
        }

        if let Some(client) = &mqtt_client {
            for command in client.poll() {
                match command {
                    Command::Theme(name) => match themes.index_of(&name) {
                        Some(idx) => theme_index = idx,
                        None => eprintln!("MQTT: unknown theme '{}'", name),
                    },
                    Command::NextTheme => theme_index = (theme_index + 1) % themes.len(),
                    Command::PrevTheme => {
                        theme_index = (theme_index + themes.len() - 1) % themes.len()
                    }
                    Command::Pause => paused = true,
                    Command::Resume => paused = false,
                    Command::Rate(rate) => {
                        rows_per_second = rate.clamp(MIN_ROWS_PER_SECOND, MAX_ROWS_PER_SECOND)
                    }
                    Command::Quit => running = false,
                }
            }
        }

        // Fixed-timestep ingestion: one spectrum row per step, with a cap on
        // catch-up so a long stall can't freeze the loop
        let step = 1.0 / rows_per_second;
        accumulator += dt;
        let mut steps = 0;
        while accumulator >= step && steps < MAX_CATCHUP_STEPS {
            if paused {
                waterfall.ingest(&[]);
            } else {
                let frame = source.next_frame(step);
                waterfall.ingest(frame);
            }
            accumulator -= step;
            steps += 1;
        }
        if steps == MAX_CATCHUP_STEPS {
            accumulator = 0.0;
        }

        display.begin_frame();
        let viewport_width = display.width();
        {
            let mut surface = SdlTileSurface::new(display.canvas_mut(), &mut tiles);
            waterfall.present(&mut surface, themes.get(theme_index), viewport_width)?;
        }
        display.end_frame();

        title_timer += dt;
        if title_timer >= 0.5 {
            title_timer = 0.0;
            display.set_title(&format!(
                "specfall - {} - {:.0} rows/s - {:.1} fps{}",
                themes.get(theme_index).name(),
                rows_per_second,
                avg_fps,
                if paused { " [paused]" } else { "" }
            ));
        }
    }

    println!("Shutting down");
    Ok(())
}
