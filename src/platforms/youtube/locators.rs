//! XPath locators for the upload dialog and the Studio video list.

pub const INPUT_FILE_VIDEO: &str = "//input[@type='file']";
pub const INPUT_FILE_THUMBNAIL: &str = "//input[@id='file-loader']";
pub const SHOW_THUMBNAIL_LOADER_JS: &str =
    "(function() { const el = document.getElementById('file-loader'); if (el) { el.style = 'display: block !important'; } return !!el; })()";

pub const TITLE_FIELD: &str = "(//*[@id='textbox'])[1]";
pub const DESCRIPTION_FIELD: &str = "//*[@id='description-container']//*[@id='textbox']";

pub const NOT_MADE_FOR_KIDS_RADIO: &str = "//*[@name='VIDEO_MADE_FOR_KIDS_NOT_MFK']//*[@id='radioLabel']";
pub const MADE_FOR_KIDS_RADIO: &str = "//*[@name='VIDEO_MADE_FOR_KIDS_MFK']//*[@id='radioLabel']";

pub const MORE_OPTIONS_BUTTON: &str = "//*[@id='toggle-button']";
pub const TAGS_INPUT: &str = "//ytcp-free-text-chip-bar//*[@id='text-input']";
pub const TAGS_CLEAR_BUTTON: &str = "//ytcp-free-text-chip-bar//*[@id='clear-button']";

pub const NEXT_BUTTON: &str = "//*[@id='next-button']";
pub const PUBLIC_RADIO: &str = "//*[@name='PUBLIC']//*[@id='radioLabel']";
pub const SCHEDULE_RADIO: &str = "//*[@name='SCHEDULE']//*[@id='radioLabel']";

pub const SCHEDULE_DATE_DROPDOWN: &str = "//ytcp-visibility-scheduler//ytcp-datetime-picker//ytcp-text-dropdown-trigger[1]//ytcp-dropdown-trigger";
pub const SCHEDULE_DATE_INPUT: &str = "//ytcp-date-picker//tp-yt-paper-input//input";
pub const SCHEDULE_TIME_DROPDOWN: &str = "//ytcp-visibility-scheduler//ytcp-datetime-picker//ytcp-text-dropdown-trigger[2]//ytcp-dropdown-trigger";
pub const SCHEDULE_TIME_ITEMS: &str = "//ytcp-time-of-day-picker//tp-yt-paper-listbox/tp-yt-paper-item";

pub const STATUS_CONTAINER: &str = "//ytcp-uploads-dialog//ytcp-video-upload-progress/span";
/// Status text shown while the file is still being sent.
pub const UPLOADING_MARKER: &str = "Uploading";

pub const VIDEO_URL_ELEMENT: &str = "//span[contains(@class, 'video-url-fadeable')]//a[contains(@class, 'ytcp-video-info')]";
pub const DONE_BUTTON: &str = "//*[@id='done-button']";
pub const ERROR_CONTAINER: &str = "//*[@id='error-message']";
pub const VIDEO_NOT_FOUND_ERROR: &str = "Could not find video_id";

pub const VIDEO_ROWS: &str = "//ytcp-video-row";
pub const TOOLTIP: &str = "//tp-yt-paper-tooltip[not(@hidden)]//*[@id='tooltip']";
pub const PAGE_LANG_JS: &str = "document.documentElement.lang || ''";

/// Item `index` (1-based) of the time picker list.
pub fn schedule_time_item(index: usize) -> String {
    format!("({})[{}]", SCHEDULE_TIME_ITEMS, index)
}

/// Date cell of row `index` (1-based) in the video list.
pub fn row_date_cell(index: usize) -> String {
    format!(
        "({})[{}]//div[contains(@class, 'tablecell-date')]",
        VIDEO_ROWS, index
    )
}
