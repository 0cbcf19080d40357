/// Procedure every runner container executes on start.
///
/// Installs `psql` when missing, then pulls the experiment's system packages,
/// pip packages, wheel payloads and script body from the database named by
/// `DB_URL`, and runs the script.
pub const BOOTSTRAP_SCRIPT: &str = r#"
is_updated=0
if ! command -v psql >/dev/null 2>&1; then
    is_updated=1
    apt-get --yes update
    apt-get --yes install postgresql-client
fi
shell_install=$(psql "$DB_URL" -c "SELECT shell_install FROM Experiment WHERE id='$EXPERIMENT_ID' LIMIT 1;" -t -A)
if [ -n "$shell_install" ]; then
    if [ "$is_updated" -eq 0 ]; then
        is_updated=1
        apt-get --yes update
    fi
    cmd="apt-get --yes install $shell_install"
    eval $cmd
fi
pip_install=$(psql "$DB_URL" -c "SELECT pip_install FROM Experiment WHERE id='$EXPERIMENT_ID' LIMIT 1;" -t -A)
if [ -n "$pip_install" ]; then
    cmd="python -m pip install $pip_install"
    eval $cmd
fi
filenames=$(psql "$DB_URL" -c "SELECT name FROM wheel WHERE experiment_id='$EXPERIMENT_ID';" -t -A)
if [ -n "$filenames" ]; then
    echo "$filenames" | while IFS= read -r filename; do
        echo "Processing filename: $filename"
        psql "$DB_URL" -c "COPY (SELECT embedded FROM wheel WHERE experiment_id='$EXPERIMENT_ID' AND name='$filename') TO STDOUT WITH BINARY;" > "$filename"
        cmd="python -m pip install $filename"
        eval $cmd
    done
fi
result=$(psql "$DB_URL" -c "SELECT script FROM Experiment WHERE id='$EXPERIMENT_ID' LIMIT 1;" -t -A)
printf "%s" "$result" > "startup.py"
python startup.py
"#;

/// Entrypoint that runs [`BOOTSTRAP_SCRIPT`] under `/bin/sh`.
pub fn bootstrap_command() -> Vec<String> {
    vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        BOOTSTRAP_SCRIPT.replace("\r\n", "\n"),
    ]
}
