//! Entry point for objinfo.
//! Loads a Wavefront OBJ file and reports what the renderer would receive.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use asset::{LoadOptions, Mesh};

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    path: Option<PathBuf>,
    options: LoadOptions,
    dump: bool,
    strict: bool,
}

fn parse_switch(arg: &str, name: &str) -> Option<bool> {
    // --name[=on|off]
    let rest = arg.strip_prefix("--")?.strip_prefix(name)?;
    if rest.is_empty() {
        return Some(true);
    }
    let val = rest.strip_prefix('=')?;
    Some(matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    ))
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut parsed = Args::default();
    for arg in args {
        if let Some(on) = parse_switch(&arg, "tangents") {
            parsed.options.calculate_tangents = on;
        } else if let Some(on) = parse_switch(&arg, "bitangents") {
            parsed.options.calculate_bitangents = on;
        } else if let Some(on) = parse_switch(&arg, "dump") {
            parsed.dump = on;
        } else if let Some(on) = parse_switch(&arg, "strict") {
            parsed.strict = on;
        } else if arg.starts_with("--") {
            log::warn!("Unknown flag '{}', ignoring.", arg);
        } else if parsed.path.is_none() {
            parsed.path = Some(PathBuf::from(arg));
        } else {
            log::warn!("Extra argument '{}', ignoring.", arg);
        }
    }
    parsed
}

fn print_summary(mesh: &Mesh) {
    println!("vertices:   {}", mesh.vertex_count());
    println!("triangles:  {}", mesh.triangle_count());
    println!("normals:    {}", mesh.normals.len());
    println!("tex_coords: {}", mesh.tex_coords.len());
    if let Some(t) = &mesh.tangents {
        println!("tangents:   {}", t.len());
    }
    if let Some(b) = &mesh.bitangents {
        println!("bitangents: {}", b.len());
    }
    for (name, location) in mesh.attribute_layout().iter() {
        println!("  @location({}) {}", location, name);
    }
}

fn print_dump(mesh: &Mesh) {
    for (i, p) in mesh.vertices.iter().enumerate() {
        let mut line = format!("{:>6} p={:?}", i, p);
        if let Some(n) = mesh.normals.get(i) {
            line.push_str(&format!(" n={:?}", n));
        }
        if let Some(uv) = mesh.tex_coords.get(i) {
            line.push_str(&format!(" uv={:?}", uv));
        }
        if let Some(t) = mesh.tangents.as_ref().and_then(|t| t.get(i)) {
            line.push_str(&format!(" t={:?}", t));
        }
        if let Some(b) = mesh.bitangents.as_ref().and_then(|b| b.get(i)) {
            line.push_str(&format!(" b={:?}", b));
        }
        println!("{}", line);
    }
    for tri in mesh.indices.chunks(3) {
        println!("f {:?}", tri);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1));
    let Some(path) = args.path.as_ref() else {
        bail!("usage: objinfo <file.obj> [--tangents] [--bitangents] [--dump] [--strict]");
    };
    log::info!(
        "Loading {} (tangents={}, bitangents={})",
        path.display(),
        args.options.calculate_tangents,
        args.options.calculate_bitangents
    );

    let mesh = asset::load_obj_with(path, &args.options)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    match mesh.validate() {
        Ok(()) => log::debug!("Mesh invariants hold"),
        Err(e) if args.strict => return Err(e).context("Mesh failed validation"),
        Err(e) => log::warn!("Mesh failed validation: {}", e),
    }

    print_summary(&mesh);
    if args.dump {
        print_dump(&mesh);
    }
    Ok(())
}
