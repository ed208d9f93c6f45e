use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prints which files differ between two directories, then the content of
/// every mismatching pair. Used before failing a tree comparison so the
/// mismatch is visible in the test output.
pub fn print_dir_diff(actual: &Path, expected: &Path) {
    let actual_files = relative_files(actual);
    let expected_files = relative_files(expected);

    println!("\n=== Tree comparison ===");
    for file in actual_files.difference(&expected_files) {
        println!("  only in actual:   {file:?}");
    }
    for file in expected_files.difference(&actual_files) {
        println!("  only in expected: {file:?}");
    }
    for file in actual_files.intersection(&expected_files) {
        let left = fs::read(actual.join(file)).unwrap();
        let right = fs::read(expected.join(file)).unwrap();
        if left != right {
            println!("  content differs:  {file:?}");
            if let (Ok(left), Ok(right)) = (String::from_utf8(left), String::from_utf8(right)) {
                println!("  --- actual:\n{left}");
                println!("  --- expected:\n{right}");
            }
        }
    }
    println!("=== End of comparison ===\n");
}

fn relative_files(root: &Path) -> HashSet<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect()
}

/// Asserts two trees hold the same files with the same bytes.
pub fn assert_trees_match(actual: &Path, expected: &Path) {
    if dir_diff::is_different(actual, expected).unwrap() {
        print_dir_diff(actual, expected);
        panic!("Directories differ. See above for details.");
    }
}

/// Lays out a small .NET-style solution rooted at `root`, named
/// `MyProject`, with one project GUID in the solution file.
pub fn write_solution_source(root: &Path) {
    fs::create_dir_all(root.join("MyProject")).unwrap();
    fs::write(
        root.join("MyProject.sln"),
        concat!(
            "Microsoft Visual Studio Solution File, Format Version 12.00\n",
            "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"MyProject\", ",
            "\"MyProject\\MyProject.csproj\", \"{11111111-2222-3333-4444-555555555555}\"\n",
            "EndProject\n",
        ),
    )
    .unwrap();
    fs::write(
        root.join("MyProject/MyProject.csproj"),
        "<Project><ProjectGuid>{11111111-2222-3333-4444-555555555555}</ProjectGuid></Project>\n",
    )
    .unwrap();
    fs::write(
        root.join("MyProject/Program.cs"),
        "namespace MyProject;\n\nclass Program { }\n",
    )
    .unwrap();
}
