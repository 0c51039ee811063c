use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deptree::core::{traverse, OutputMode, TraversalConfig};
use deptree::parsers::extract_exports;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A layered project where every module imports the whole layer below it,
/// so most files are reached through many paths.
fn layered_project(root: &Path, layers: usize, width: usize) -> PathBuf {
    for layer in 0..layers {
        for i in 0..width {
            let imports: String = if layer + 1 < layers {
                (0..width)
                    .map(|j| format!("import {{ service{j} }} from './layer{}_{j}';\n", layer + 1))
                    .collect()
            } else {
                String::new()
            };

            let content = format!(
                r#"{imports}
export interface Options{i} {{
    retries: number;
    label: string;
}}

export class Service{i} {{
    constructor(private readonly options: Options{i}) {{}}

    run(input: string): string {{
        return `${{this.options.label}}:${{input}}`;
    }}
}}

export const service{i} = new Service{i}({{ retries: {layer}, label: "layer{layer}" }});
"#
            );
            std::fs::write(root.join(format!("layer{layer}_{i}.ts")), content).unwrap();
        }
    }

    let entry_imports: String = (0..width)
        .map(|j| format!("import {{ service{j} }} from './layer0_{j}';\n"))
        .collect();
    let entry = root.join("main.ts");
    std::fs::write(&entry, entry_imports).unwrap();
    entry
}

fn benchmark_traversal(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");

    let small = TempDir::new().unwrap();
    let small_entry = layered_project(small.path(), 3, 5);

    let large = TempDir::new().unwrap();
    let large_entry = layered_project(large.path(), 10, 10);

    for (name, dir, entry) in [
        ("small_tree", &small, &small_entry),
        ("large_tree", &large, &large_entry),
    ] {
        let config = TraversalConfig::with_cwd(entry, dir.path(), dir.path());
        group.bench_function(name, |b| {
            b.iter(|| black_box(traverse(black_box(&config))));
        });
    }

    let list_config = TraversalConfig::with_cwd(&large_entry, large.path(), large.path())
        .with_output_mode(OutputMode::ListAbsolute);
    group.bench_function("large_list", |b| {
        b.iter(|| black_box(traverse(black_box(&list_config))));
    });

    group.finish();
}

fn benchmark_exports(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_extraction");

    let dir = TempDir::new().unwrap();
    layered_project(dir.path(), 1, 1);
    let file = dir.path().join("layer0_0.ts");

    group.bench_function("single_module", |b| {
        b.iter(|| black_box(extract_exports(black_box(&file))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_traversal, benchmark_exports);
criterion_main!(benches);
