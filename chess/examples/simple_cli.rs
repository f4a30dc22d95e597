// Simple command-line application to play chess

use gambit::{board::PrettyStyle, Color, Move, Position};
use std::io::{self, BufRead, Write};

fn main() {
    let mut stdin = io::stdin().lock();

    let mut pos = Position::initial();

    loop {
        if pos.allowed_moves().is_empty() {
            println!("No legal moves left for {:?}.", pos.side());
            println!("Final position: {}", pos.as_fen());
            break;
        }

        println!("{}", pos.pretty(PrettyStyle::Ascii));
        let side = match pos.side() {
            Color::White => "White",
            Color::Black => "Black",
        };
        print!("{} move ({}): ", side, pos.fullmove_number());
        io::stdout().flush().unwrap();
        let mut s = String::new();
        if stdin.read_line(&mut s).unwrap() == 0 {
            break;
        }
        let s = s.trim();
        if s == "quit" {
            break;
        }
        if s == "fen" {
            println!("{}", pos.as_fen());
            continue;
        }

        match Move::from_algebraic(&pos, s) {
            Ok(mv) => pos = pos.apply_move(&mv),
            Err(err) => println!("bad move: {}", err),
        }
    }

    println!("Moves played:");
    let sans: Vec<&str> = pos.history().iter().map(Move::algebraic).collect();
    println!("{}", sans.join(" "));
}
