use algoviz::compression::{
    build_frequency_table, build_huffman_tree_with_steps, format_code_list, samples, Huffman,
    Lzw, TextCompression,
};
use algoviz::Stepper;

fn main() {
    // Usage: compression_demo [preset-name | text]
    let arg = std::env::args().nth(1);
    let text = match arg.as_deref() {
        None => samples::SIMPLE.to_string(),
        Some(name) => samples::by_name(name)
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string()),
    };
    println!("Input ({} symbols): {text:?}", text.chars().count());

    println!("\n== Huffman ==");
    let frequencies = build_frequency_table(&text);
    for (symbol, count) in frequencies.iter() {
        println!("  {symbol:?}: {count}");
    }
    let build = build_huffman_tree_with_steps(&frequencies);
    let mut replay = build.replay();
    while let Some(step) = replay.step() {
        let queue: Vec<String> = step
            .queue
            .iter()
            .map(|node| match node.symbol() {
                Some(symbol) => format!("{symbol:?}:{}", node.freq()),
                None => format!("{}:{}", node.id(), node.freq()),
            })
            .collect();
        match step.merged_pair() {
            Some((left, right)) => println!(
                "  step {}: merged {} + {} -> [{}]",
                step.iteration,
                left.id(),
                right.id(),
                queue.join(", ")
            ),
            None => println!("  step {}: [{}]", step.iteration, queue.join(", ")),
        }
    }

    let huffman = Huffman::default();
    match huffman.compress(&text) {
        Ok(encoding) => {
            for (symbol, code) in encoding.codes.iter() {
                println!("  {symbol:?} -> {code}");
            }
            println!(
                "  {} bits -> {} bits (ratio {:.2})",
                encoding.stats.original_bits,
                encoding.stats.compressed_bits,
                encoding.stats.ratio()
            );
            match huffman.decompress(&encoding) {
                Ok(decoded) => println!("  round trip ok: {}", decoded == text),
                Err(e) => println!("  decode failed: {e}"),
            }
        }
        Err(e) => println!("  encode failed: {e}"),
    }

    println!("\n== LZW ==");
    let lzw = Lzw::default();
    let mut session = match lzw.session(&text) {
        Ok(session) => session,
        Err(e) => {
            println!("  cannot encode: {e}");
            return;
        }
    };
    while let Some(step) = session.step() {
        println!("  {}", step.describe());
    }
    println!("  codes: {}", format_code_list(&session.codes()));
    let stats = session.stats();
    println!(
        "  {} bits -> {} bits (ratio {:.2}), {} dictionary entries",
        stats.original_bits,
        stats.compressed_bits,
        stats.ratio(),
        session.dictionary().len()
    );
    let encoding = session.into_encoding();
    match lzw.decompress(&encoding) {
        Ok(decoded) => println!("  round trip ok: {}", decoded == text),
        Err(e) => println!("  decode failed: {e}"),
    }
}
