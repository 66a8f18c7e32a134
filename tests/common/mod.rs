use std::io::Write;
use tempfile::NamedTempFile;

pub const SCRIPT_HEADER: &str =
    "action,booking,actor,role,room,tenant,check_in,check_out,guests,file_url,file_size,content_type,as_of";

/// Writes an action script with the standard header to a temp file.
pub fn write_script(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", SCRIPT_HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

pub fn create_row(
    booking: u64,
    guest: u64,
    tenant: u64,
    room: u64,
    check_in: &str,
    check_out: &str,
    guests: u32,
) -> String {
    format!("create,{booking},{guest},guest,{room},{tenant},{check_in},{check_out},{guests},,,,")
}

pub fn upload_row(booking: u64, guest: u64, url: &str, size: u64, content_type: &str) -> String {
    format!("upload_proof,{booking},{guest},guest,,,,,,{url},{size},{content_type},")
}

/// Row for the payload-free actions (cancel, approve, reject, remind).
pub fn action_row(action: &str, booking: u64, actor: u64, role: &str) -> String {
    format!("{action},{booking},{actor},{role},,,,,,,,,")
}

pub fn complete_row(booking: u64, as_of: &str) -> String {
    format!("complete,{booking},0,system,,,,,,,,,{as_of}")
}
