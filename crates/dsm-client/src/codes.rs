//! DSM error code descriptions.
//!
//! Codes below 400 are shared by every web API. Codes from 400 upwards are
//! API specific, and the Auth API reuses the 400 range with its own meaning.

use crate::api::AUTH_API;

/// Codes that mean the SID is no longer usable and a fresh login is needed.
pub const SESSION_EXPIRED_CODES: [i64; 3] = [106, 107, 119];

pub fn is_session_expired(code: i64) -> bool {
    SESSION_EXPIRED_CODES.contains(&code)
}

pub fn describe(api: &str, code: i64) -> &'static str {
    if api == AUTH_API {
        if let Some(message) = describe_auth(code) {
            return message;
        }
    }

    match code {
        100 => "Unknown error",
        101 => "No parameter of API, method or version",
        102 => "The requested API does not exist",
        103 => "The requested method does not exist",
        104 => "The requested version does not support the functionality",
        105 => "The logged in session does not have permission",
        106 => "Session timeout",
        107 => "Session interrupted by duplicate login",
        108 => "Failed to upload the file",
        109 => "The network connection is unstable or the system is busy",
        110 => "The network connection is unstable or the system is busy",
        111 => "The network connection is unstable or the system is busy",
        114 => "Lost parameters for this API",
        115 => "Not allowed to upload a file",
        116 => "Not allowed to perform for a demo site",
        117 => "The network connection is unstable or the system is busy",
        118 => "The network connection is unstable or the system is busy",
        119 => "Invalid session",
        150 => "Request source IP does not match the login IP",
        160 => "Insufficient application privilege",
        400 => "Invalid parameter of file operation",
        401 => "Unknown error of file operation",
        402 => "System is too busy",
        403 => "Invalid user does this file operation",
        404 => "Invalid group does this file operation",
        405 => "Invalid user and group does this file operation",
        406 => "Can't get user/group information from the account server",
        407 => "Operation not permitted",
        408 => "No such file or directory",
        409 => "Non-supported file system",
        410 => "Failed to connect internet-based file system",
        411 => "Read-only file system",
        412 => "Filename too long in the non-encrypted file system",
        413 => "Filename too long in the encrypted file system",
        414 => "File already exists",
        415 => "Disk quota exceeded",
        416 => "No space left on device",
        417 => "Input/output error",
        418 => "Illegal name or path",
        419 => "Illegal file name",
        420 => "Illegal file name on FAT file system",
        421 => "Device or resource busy",
        599 => "No such task of the file operation",
        900 => "Failed to delete file(s)/folder(s)",
        1000 => "Failed to copy files/folders",
        1001 => "Failed to move files/folders",
        1002 => "An error occurred at the destination",
        1003 => "Cannot overwrite or skip the existing file because no overwrite parameter is given",
        1004 => "File cannot overwrite a folder with the same name, or folder cannot overwrite a file with the same name",
        1006 => "Cannot copy/move file/folder with special characters to a FAT32 file system",
        1007 => "Cannot copy/move a file bigger than 4G to a FAT32 file system",
        1100 => "Failed to create a folder",
        1101 => "The number of folders to the parent folder would exceed the system limitation",
        1200 => "Failed to rename it",
        1800 => "Content-Length is missing or does not match the received size",
        1801 => "Timed out waiting for data from the client",
        1802 => "No filename information in the last part of file content",
        1803 => "Upload connection is cancelled",
        1804 => "Failed to upload oversized file to FAT file system",
        1805 => "Can't overwrite or skip the existing file, if no overwrite parameter is given",
        2000 => "Sufficient user privilege is required",
        2001 => "Failed to create the sharing link",
        2002 => "The sharing link does not exist",
        _ => "Unrecognized error",
    }
}

fn describe_auth(code: i64) -> Option<&'static str> {
    let message = match code {
        400 => "No such account or incorrect password",
        401 => "Disabled account",
        402 => "Denied permission",
        403 => "2-factor authentication code required",
        404 => "Failed to authenticate 2-factor authentication code",
        406 => "Enforce to authenticate with 2-factor authentication code",
        407 => "Blocked IP source",
        408 => "Expired password cannot change",
        409 => "Expired password",
        410 => "Password must be changed",
        _ => return None,
    };
    Some(message)
}
